//! `ClientConfig` (SPEC_FULL §3).

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// §4.4 `WAIT_ITEMS`.
    #[serde(default = "default_wait_items")]
    pub wait_items: usize,
    /// §4.4 `WAIT_MS`.
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
    /// Namespace prefix applied to the persisted `sid`/`at`/`ac` keys,
    /// for hosts sharing one store across components (§5 "shared resources").
    #[serde(default)]
    pub key_prefix: Option<String>,
    /// Reserved session-timeout hook (§3 "Session Identity" lifetime).
    /// Unset means the timeout predicate always evaluates false, matching
    /// the documented default.
    #[serde(skip)]
    pub session_timeout: Option<Duration>,
}

fn default_wait_items() -> usize {
    epc_output::DEFAULT_WAIT_ITEMS
}

fn default_wait_ms() -> u64 {
    epc_output::DEFAULT_WAIT_MS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            wait_items: default_wait_items(),
            wait_ms: default_wait_ms(),
            key_prefix: None,
            session_timeout: None,
        }
    }
}
