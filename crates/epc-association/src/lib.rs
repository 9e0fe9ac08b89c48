//! epc-association: pageview/session/activity identity lifecycle (spec
//! §4.2), built over the `epc_core::PersistentStore`/`RandomSource` ports.

pub mod error;

pub use error::AssociationError;

use epc_core::{Association, PersistentStore, RandomSource};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct State {
    pageview_id: Option<String>,
    session_id: Option<String>,
    activity_table: Option<HashMap<String, u32>>,
    activity_count: Option<u32>,
}

/// Owns the keys `sid`, `at`, `ac` (optionally namespaced by `key_prefix`)
/// in the host's persistent store; see spec §5 "Shared resources".
pub struct AssociationController {
    store: Arc<dyn PersistentStore>,
    random: Arc<dyn RandomSource>,
    key_prefix: Option<String>,
    state: Mutex<State>,
}

impl AssociationController {
    pub fn new(store: Arc<dyn PersistentStore>, random: Arc<dyn RandomSource>, key_prefix: Option<String>) -> Self {
        Self { store, random, key_prefix, state: Mutex::new(State::default()) }
    }

    fn key(&self, base: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{prefix}{base}"),
            None => base.to_string(),
        }
    }

    fn ensure_activity_loaded(&self, state: &mut State) {
        if state.activity_table.is_some() {
            return;
        }

        let at_key = self.key("at");
        let ac_key = self.key("ac");

        let at_loaded = self.store.get_persistent(&at_key).unwrap_or_else(|err| {
            tracing::warn!(key = %at_key, error = %err, "store read failed; treating activity table as absent");
            None
        });
        let ac_loaded = self.store.get_persistent(&ac_key).unwrap_or_else(|err| {
            tracing::warn!(key = %ac_key, error = %err, "store read failed; treating activity count as absent");
            None
        });

        let table: HashMap<String, u32> =
            at_loaded.as_ref().and_then(|v| serde_json::from_value(v.clone()).ok()).unwrap_or_default();
        let count: u32 = ac_loaded.as_ref().and_then(|v| v.as_u64()).map(|n| n as u32).unwrap_or(1);

        if at_loaded.is_none() || ac_loaded.is_none() {
            self.persist_activity(&table, count);
        }

        state.activity_table = Some(table);
        state.activity_count = Some(count);
    }

    fn persist_activity(&self, table: &HashMap<String, u32>, count: u32) {
        self.warn_on_persist_failure("at", self.store.set_persistent(&self.key("at"), json!(table)));
        self.warn_on_persist_failure("ac", self.store.set_persistent(&self.key("ac"), json!(count)));
    }

    /// Builds and logs an [`AssociationError::Persist`] for visibility, then
    /// drops it — a write failure here never fails the caller of `log`
    /// (spec §7 "handled at the layer where they occur").
    fn warn_on_persist_failure(&self, base_key: &str, result: Result<(), epc_core::StoreError>) {
        if let Err(source) = result {
            let err = AssociationError::Persist { key: self.key(base_key), source };
            tracing::warn!(error = %err, "failed to persist association state");
        }
    }
}

impl Association for AssociationController {
    fn pageview_id(&self) -> String {
        let mut state = self.state.lock().unwrap();
        if let Some(id) = &state.pageview_id {
            return id.clone();
        }
        let id = self.random.generate_id();
        state.pageview_id = Some(id.clone());
        id
    }

    fn session_id(&self) -> String {
        let mut state = self.state.lock().unwrap();
        if let Some(id) = &state.session_id {
            return id.clone();
        }

        let key = self.key("sid");
        let loaded = self.store.get_persistent(&key).unwrap_or_else(|err| {
            tracing::warn!(key = %key, error = %err, "store read failed; treating session id as absent");
            None
        });

        let id = match loaded.and_then(|v| v.as_str().map(str::to_owned)) {
            Some(id) => id,
            None => {
                let id = self.random.generate_id();
                self.warn_on_persist_failure("sid", self.store.set_persistent(&key, json!(id)));
                id
            }
        };

        state.session_id = Some(id.clone());
        id
    }

    fn activity_id(&self, stream: &str, scope_id: &str) -> String {
        let mut state = self.state.lock().unwrap();
        self.ensure_activity_loaded(&mut state);

        if !state.activity_table.as_ref().unwrap().contains_key(stream) {
            let seq = *state.activity_count.as_ref().unwrap();
            state.activity_table.as_mut().unwrap().insert(stream.to_string(), seq);
            *state.activity_count.as_mut().unwrap() += 1;
            let table = state.activity_table.clone().unwrap();
            let count = *state.activity_count.as_ref().unwrap();
            self.persist_activity(&table, count);
        }

        let seq = state.activity_table.as_ref().unwrap()[stream];
        epc_domain::activity_id(scope_id, seq)
    }

    fn begin_new_session(&self) {
        let mut state = self.state.lock().unwrap();
        *state = State::default();
        drop(state);

        for key in [self.key("sid"), self.key("at"), self.key("ac")] {
            if let Err(err) = self.store.del_persistent(&key) {
                tracing::warn!(key = %key, error = %err, "failed to clear persisted identity state");
            }
        }
    }

    fn begin_new_activity(&self, stream: &str) {
        let mut state = self.state.lock().unwrap();
        self.ensure_activity_loaded(&mut state);
        state.activity_table.as_mut().unwrap().remove(stream);
        let table = state.activity_table.clone().unwrap();
        drop(state);

        self.warn_on_persist_failure("at", self.store.set_persistent(&self.key("at"), json!(table)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epc_core::testkit::{InMemoryStore, SequentialRandomSource};

    fn controller() -> AssociationController {
        AssociationController::new(Arc::new(InMemoryStore::new()), Arc::new(SequentialRandomSource::new()), None)
    }

    #[test]
    fn activity_id_is_idempotent_per_stream() {
        let assoc = controller();
        let scope = assoc.pageview_id();
        let first = assoc.activity_id("edit", &scope);
        let second = assoc.activity_id("edit", &scope);
        assert_eq!(first, second);
    }

    #[test]
    fn activity_id_assigns_sequentially_across_streams() {
        let assoc = controller();
        let scope = assoc.pageview_id();
        let a = assoc.activity_id("edit", &scope);
        let b = assoc.activity_id("save", &scope);
        assert!(a.ends_with("0001"));
        assert!(b.ends_with("0002"));
    }

    #[test]
    fn begin_new_activity_forces_a_fresh_sequence_number() {
        let assoc = controller();
        let scope = assoc.pageview_id();
        let first = assoc.activity_id("edit", &scope);
        assoc.begin_new_activity("edit");
        let second = assoc.activity_id("edit", &scope);
        assert_ne!(first, second, "ACTIVITY_COUNT never decreases, so re-assignment takes the next free slot");
        assert!(second.ends_with("0002"));
    }

    #[test]
    fn session_id_survives_a_fresh_controller_over_the_same_store() {
        let store = Arc::new(InMemoryStore::new());
        let random = Arc::new(SequentialRandomSource::new());
        let first = AssociationController::new(store.clone(), random.clone(), None).session_id();
        let second = AssociationController::new(store, random, None).session_id();
        assert_eq!(first, second);
    }

    #[test]
    fn begin_new_session_clears_pageview_and_activities() {
        let assoc = controller();
        let pageview_before = assoc.pageview_id();
        let sid_before = assoc.session_id();
        assoc.activity_id("edit", &pageview_before);

        assoc.begin_new_session();

        let pageview_after = assoc.pageview_id();
        let sid_after = assoc.session_id();
        assert_ne!(pageview_before, pageview_after);
        assert_ne!(sid_before, sid_after);
        assert_eq!(assoc.activity_id("edit", &pageview_after), epc_domain::activity_id(&pageview_after, 1));
    }
}
