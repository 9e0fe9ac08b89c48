use thiserror::Error;

/// The root aggregate error type (SPEC_FULL §2). `Client`'s own methods
/// never return this — `log`/`configure`/etc. follow §7's propagation
/// policy and swallow-and-log — but it composes the lower-level error
/// types for hosts and downstream adapters that want a single type to
/// match on across crate boundaries.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Association(#[from] epc_association::AssociationError),

    #[error(transparent)]
    Output(#[from] epc_output::OutputError),

    #[error(transparent)]
    Domain(#[from] epc_domain::DomainError),

    #[error(transparent)]
    Infra(#[from] epc_infra::InfraError),
}
