use thiserror::Error;

/// Errors from the concrete, I/O-bound adapters. Mapped at the call site
/// into `epc_core::StoreError` so the core never has to know this crate
/// exists.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("failed to read store file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write store file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("store file contents are not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}
