//! epc-providers: dependency-light default implementations of the
//! `Clock`/`RandomSource`/`DoNotTrackSignal` ports (spec §6), for hosts that
//! have no platform-specific equivalent to wire in.

use epc_core::{Clock, DoNotTrackSignal, RandomSource};
use rand::RngCore;
use std::sync::atomic::{AtomicBool, Ordering};

/// Wall-clock time via `chrono`, formatted as ISO-8601 UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_iso_8601(&self) -> String {
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}

/// OS-backed randomness for identity generation.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandomSource;

impl RandomSource for OsRandomSource {
    fn generate_id(&self) -> String {
        let mut bytes = [0u8; 10];
        rand::thread_rng().fill_bytes(&mut bytes);
        epc_domain::scope_id_from_bytes(&bytes)
    }

    fn generate_uuid_v4(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// A do-not-track flag the host can flip at runtime (e.g. from a browser
/// `navigator.doNotTrack` read or a platform privacy setting).
#[derive(Debug, Default)]
pub struct ToggleDoNotTrack(AtomicBool);

impl ToggleDoNotTrack {
    pub fn new(cannot_be_tracked: bool) -> Self {
        Self(AtomicBool::new(cannot_be_tracked))
    }

    pub fn set(&self, cannot_be_tracked: bool) {
        self.0.store(cannot_be_tracked, Ordering::Relaxed);
    }
}

impl DoNotTrackSignal for ToggleDoNotTrack {
    fn client_cannot_be_tracked(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
