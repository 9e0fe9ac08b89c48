//! Stream configuration (spec §3 "Stream").

use serde::{Deserialize, Serialize};

/// The identity lifetime window sampling and activity ids are anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Session,
    Pageview,
}

impl Default for Scope {
    fn default() -> Self {
        Self::Pageview
    }
}

/// Sampling configuration for a stream. The prototype this spec was
/// distilled from is inconsistent about `rate` vs `one_in_every`; both are
/// accepted here. `one_in_every` wins when both are present (see
/// DESIGN.md "sampling config precedence").
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default)]
    pub one_in_every: Option<u64>,
}

impl SampleConfig {
    pub fn is_empty(&self) -> bool {
        self.rate.is_none() && self.one_in_every.is_none()
    }
}

/// Per-stream config recognised by the dispatcher (spec §3).
///
/// Unknown keys in the source config map are ignored, not an error; missing
/// fields fall back to the documented defaults below rather than rejecting
/// the stream (spec §7 `ConfigShapeError`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamConfig {
    pub destination: Option<String>,
    #[serde(rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub sample: SampleConfig,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Supplemental (SPEC_FULL §4): debug streams always fire and skip
    /// sampling, and get `meta.is_debug = true` stamped on admission.
    #[serde(default)]
    pub is_debug: bool,
}

fn default_true() -> bool {
    true
}

impl StreamConfig {
    /// Non-fatal shape validation: a destination-less stream can still be
    /// registered (it will simply never reach `output.schedule`).
    pub fn missing_destination(&self) -> bool {
        self.destination.is_none()
    }
}
