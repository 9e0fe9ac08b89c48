use epc_core::StoreError;
use thiserror::Error;

/// Errors surfaced while resolving identity (spec §7 `StoreError`). A read
/// failure is never fatal here — callers treat it as "absent" and regenerate
/// — so this type only carries the write path, which is logged and does not
/// change in-memory state.
#[derive(Debug, Error)]
pub enum AssociationError {
    #[error("failed to persist `{key}`: {source}")]
    Persist {
        key: String,
        #[source]
        source: StoreError,
    },
}
