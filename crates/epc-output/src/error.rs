use thiserror::Error;

/// Misconfiguration of the buffer itself (spec §7 — transport failures are
/// deliberately not a variant here; they are fire-and-forget by design).
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("wait_items must be at least 1, got {0}")]
    InvalidWaitItems(usize),
}
