use thiserror::Error;

/// Domain-level errors. None of these are fatal to the caller of the public
/// API (see `epc::ClientError` for how they get swallowed at the boundary);
/// they exist so the layers above can log and make a decision.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A stream config entry is missing or has a malformed required field.
    /// The entry is still admitted to the registry; the caller falls back to
    /// the documented defaults (`is_available = true`, `scope = pageview`, ...).
    #[error("malformed stream config for `{stream}`: {reason}")]
    ConfigShape { stream: String, reason: String },

    /// The event could not be turned into canonical JSON. Fatal for that one
    /// event only.
    #[error("event serialisation failed: {0}")]
    Serialisation(#[from] serde_json::Error),
}
