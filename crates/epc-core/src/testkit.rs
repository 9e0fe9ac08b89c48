//! Mock collaborators shared by unit tests in this crate and integration
//! tests in the root `epc` crate (SPEC_FULL §5). Gated so production builds
//! never pull this in.

use crate::ports::{Association, Clock, DoNotTrackSignal, OutputSink, PersistentStore, RandomSource, StoreError};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory `PersistentStore`. Never returns an error; a real store's read
/// failures are handled by the caller treating `Ok(None)` as absent.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Mutex<HashMap<String, serde_json::Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistentStore for InMemoryStore {
    fn get_persistent(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn set_persistent(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.data.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    fn del_persistent(&self, key: &str) -> Result<(), StoreError> {
        self.data.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Returns the same instant every time.
pub struct FixedClock(String);

impl FixedClock {
    pub fn new(iso: &str) -> Self {
        Self(iso.to_string())
    }
}

impl Clock for FixedClock {
    fn now_iso_8601(&self) -> String {
        self.0.clone()
    }
}

/// Deterministic id generation: counts up instead of calling into the OS RNG.
#[derive(Default)]
pub struct SequentialRandomSource {
    next: Mutex<u64>,
}

impl SequentialRandomSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RandomSource for SequentialRandomSource {
    fn generate_id(&self) -> String {
        let mut next = self.next.lock().unwrap();
        let id = format!("{:020x}", *next);
        *next += 1;
        id
    }

    fn generate_uuid_v4(&self) -> String {
        let mut next = self.next.lock().unwrap();
        let id = format!("00000000-0000-4000-8000-{:012x}", *next);
        *next += 1;
        id
    }
}

/// A do-not-track signal fixed at construction time.
pub struct StaticDnt(bool);

impl StaticDnt {
    pub fn new(cannot_be_tracked: bool) -> Self {
        Self(cannot_be_tracked)
    }
}

impl DoNotTrackSignal for StaticDnt {
    fn client_cannot_be_tracked(&self) -> bool {
        self.0
    }
}

/// A fixed pageview/session identity with a per-stream activity counter,
/// enough to exercise the dispatcher without pulling in `epc-association`.
pub struct StaticAssociation {
    pageview_id: String,
    session_id: String,
    activities: Mutex<HashMap<String, u32>>,
}

impl Default for StaticAssociation {
    fn default() -> Self {
        Self {
            pageview_id: "11111111111111111111".to_string(),
            session_id: "22222222222222222222".to_string(),
            activities: Mutex::new(HashMap::new()),
        }
    }
}

impl Association for StaticAssociation {
    fn pageview_id(&self) -> String {
        self.pageview_id.clone()
    }

    fn session_id(&self) -> String {
        self.session_id.clone()
    }

    fn activity_id(&self, stream: &str, scope_id: &str) -> String {
        let mut activities = self.activities.lock().unwrap();
        let len = activities.len() as u32;
        let seq = *activities.entry(stream.to_string()).or_insert_with(|| len + 1);
        epc_domain::activity_id(scope_id, seq)
    }

    fn begin_new_session(&self) {
        self.activities.lock().unwrap().clear();
    }

    fn begin_new_activity(&self, stream: &str) {
        self.activities.lock().unwrap().remove(stream);
    }
}

/// Captures every `(url, body)` handed to `schedule` in call order.
#[derive(Default)]
pub struct RecordingOutput {
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl OutputSink for RecordingOutput {
    fn schedule(&self, url: String, body: String) {
        self.calls.lock().unwrap().push((url, body));
    }
}
