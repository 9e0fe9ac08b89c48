//! The stream dispatcher (spec §4.1): the per-event contract that ties the
//! registry, cascade graph, deferred buffer, and the four collaborator ports
//! together.

use crate::deferred::DeferredInputBuffer;
use crate::ports::{Association, Clock, DoNotTrackSignal, OutputSink, RandomSource};
use crate::registry::StreamConfigRegistry;
use epc_domain::{Event, Scope, StreamConfig};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct StreamDispatcher {
    registry: Mutex<StreamConfigRegistry>,
    deferred: Mutex<DeferredInputBuffer>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    dnt: Arc<dyn DoNotTrackSignal>,
    association: Arc<dyn Association>,
    output: Arc<dyn OutputSink>,
}

impl StreamDispatcher {
    pub fn new(
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        dnt: Arc<dyn DoNotTrackSignal>,
        association: Arc<dyn Association>,
        output: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            registry: Mutex::new(StreamConfigRegistry::new()),
            deferred: Mutex::new(DeferredInputBuffer::new()),
            clock,
            random,
            dnt,
            association,
            output,
        }
    }

    /// §4.5: merge-but-do-not-overwrite, recompute cascade, then re-drain
    /// whatever was waiting on a stream that just became known.
    pub fn configure(&self, config_map: HashMap<String, StreamConfig>) {
        self.registry.lock().unwrap().configure(config_map);
        self.drain_deferred();
    }

    fn drain_deferred(&self) {
        let pending = self.deferred.lock().unwrap().drain_all();
        for (stream, data) in pending {
            self.log(&stream, data);
        }
    }

    /// §4.1 steps 1-3: timestamp, defer-if-unknown, cascade. Steps 4-9 run
    /// once per (stream, copy) pair in [`Self::dispatch_one`] — cascade
    /// children are not re-cascaded because `cascade[stream]` already
    /// enumerates every descendant (see `registry.rs`). Infallible: a
    /// serialisation failure on any one (stream, copy) pair is logged and
    /// that pair is dropped; callers that want that failure surfaced should
    /// use [`Self::log_checked`] instead.
    pub fn log(&self, stream: &str, data: Event) {
        let Some((children, data)) = self.prepare(stream, data) else { return };

        for child in &children {
            self.dispatch_one(child, data.duplicate_for_cascade());
        }

        self.dispatch_one(stream, data);
    }

    /// Same contract as [`Self::log`], except the primary stream's own
    /// serialisation failure (not a cascade child's) is returned instead of
    /// only logged — SPEC_FULL §2's one fallible entry point. Cascade
    /// children still swallow-and-log: they are duplicates of the same
    /// logical event, and a write-side copy's failure should not prevent the
    /// primary send this call is actually waited on for.
    pub fn log_checked(&self, stream: &str, data: Event) -> Result<(), epc_domain::DomainError> {
        let Some((children, data)) = self.prepare(stream, data) else { return Ok(()) };

        for child in &children {
            self.dispatch_one(child, data.duplicate_for_cascade());
        }

        self.dispatch_one_checked(stream, data)
    }

    /// Steps 1-3, shared by [`Self::log`] and [`Self::log_checked`]: stamp
    /// the timestamp, defer if the stream is still unregistered, and look up
    /// its cascade children. Returns `None` when the event was deferred.
    fn prepare(&self, stream: &str, mut data: Event) -> Option<(Vec<String>, Event)> {
        let _span = tracing::debug_span!("epc.log", stream = %stream).entered();

        let now = self.clock.now_iso_8601();
        data.ensure_timestamp(&now);

        let registry = self.registry.lock().unwrap();
        if !registry.contains(stream) {
            drop(registry);
            tracing::debug!(stream, "stream not yet configured; deferring");
            self.deferred.lock().unwrap().push(stream.to_string(), data);
            return None;
        }
        Some((registry.cascade_children(stream).to_vec(), data))
    }

    /// §4.1 steps 4-9 for a single already-registered stream, swallowing and
    /// logging a serialisation failure instead of propagating it.
    fn dispatch_one(&self, stream: &str, data: Event) {
        if let Err(err) = self.dispatch_one_checked(stream, data) {
            tracing::error!(stream, error = %err, "event serialisation failed; dropping");
        }
    }

    /// §4.1 steps 4-9 for a single already-registered stream. Every early
    /// return for a gate (unavailable, do-not-track, not sampled, no
    /// destination) is `Ok(())` — those are deliberate drops, not errors;
    /// only a genuine serialisation failure is `Err`.
    fn dispatch_one_checked(&self, stream: &str, mut data: Event) -> Result<(), epc_domain::DomainError> {
        let cfg = match self.registry.lock().unwrap().get(stream) {
            Some(cfg) => cfg.clone(),
            None => {
                tracing::warn!(stream, "cascade child vanished between lookup and dispatch");
                return Ok(());
            }
        };

        if !cfg.is_available {
            tracing::debug!(stream, "dropped: stream unavailable");
            return Ok(());
        }

        if self.dnt.client_cannot_be_tracked() && !cfg.is_private {
            tracing::debug!(stream, "dropped: do-not-track");
            return Ok(());
        }

        let scope_id = match cfg.scope {
            Scope::Session => self.association.session_id(),
            Scope::Pageview => self.association.pageview_id(),
        };

        if !cfg.is_debug && !epc_sampling::in_sample(&scope_id, &cfg.sample) {
            tracing::debug!(stream, "dropped: not in sample");
            return Ok(());
        }

        data.enrich(self.random.generate_uuid_v4(), stream.to_string(), cfg.schema.clone(), cfg.is_debug);

        if !cfg.is_private {
            let activity_id = self.association.activity_id(stream, &scope_id);
            data.set_identity_fields(&self.association.pageview_id(), &self.association.session_id(), &activity_id);
        }

        let Some(destination) = cfg.destination.clone() else {
            tracing::warn!(stream, "admitted event has no destination configured; dropping");
            return Ok(());
        };

        let body = data.into_canonical_json()?;
        self.output.schedule(destination, body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{FixedClock, RecordingOutput, SequentialRandomSource, StaticAssociation, StaticDnt};
    use epc_domain::SampleConfig;
    use serde_json::json;

    fn event(v: serde_json::Value) -> Event {
        Event::new(v.as_object().unwrap().clone())
    }

    fn dispatcher(output: Arc<RecordingOutput>, dnt: bool) -> StreamDispatcher {
        StreamDispatcher::new(
            Arc::new(FixedClock::new("2024-01-01T00:00:00Z")),
            Arc::new(SequentialRandomSource::new()),
            Arc::new(StaticDnt::new(dnt)),
            Arc::new(StaticAssociation::default()),
            output,
        )
    }

    fn cfg(destination: &str) -> StreamConfig {
        StreamConfig { destination: Some(destination.into()), ..Default::default() }
    }

    #[test]
    fn deferred_event_drains_on_configure() {
        let output = Arc::new(RecordingOutput::new());
        let d = dispatcher(output.clone(), false);
        d.log("edit", event(json!({"a": 1})));
        assert!(output.calls().is_empty());

        d.configure(HashMap::from([("edit".into(), cfg("/l"))]));
        let calls = output.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "/l");
        assert!(calls[0].1.contains("\"a\":1"));
    }

    #[test]
    fn cascade_delivers_to_child_with_same_dt() {
        let output = Arc::new(RecordingOutput::new());
        let d = dispatcher(output.clone(), false);
        d.configure(HashMap::from([("edit".into(), cfg("/e")), ("edit.growth".into(), cfg("/g"))]));
        d.log("edit", event(json!({"x": 1})));

        let calls = output.calls();
        assert_eq!(calls.len(), 2);
        let destinations: Vec<&str> = calls.iter().map(|(url, _)| url.as_str()).collect();
        assert!(destinations.contains(&"/e"));
        assert!(destinations.contains(&"/g"));
    }

    #[test]
    fn do_not_track_blocks_non_private_stream() {
        let output = Arc::new(RecordingOutput::new());
        let d = dispatcher(output.clone(), true);
        d.configure(HashMap::from([("s".into(), cfg("/s"))]));
        d.log("s", event(json!({})));
        assert!(output.calls().is_empty());
    }

    #[test]
    fn private_stream_under_dnt_still_sends_without_identity_fields() {
        let output = Arc::new(RecordingOutput::new());
        let d = dispatcher(output.clone(), true);
        let mut private_cfg = cfg("/s");
        private_cfg.is_private = true;
        d.configure(HashMap::from([("s".into(), private_cfg)]));
        d.log("s", event(json!({})));

        let calls = output.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].1.contains("pageview_id"));
        assert!(!calls[0].1.contains("session_id"));
        assert!(!calls[0].1.contains("activity_id"));
    }

    #[test]
    fn unregistered_stream_never_schedules() {
        let output = Arc::new(RecordingOutput::new());
        let d = dispatcher(output.clone(), false);
        d.log("nope", event(json!({})));
        assert!(output.calls().is_empty());
    }

    #[test]
    fn log_checked_delivers_and_returns_ok_on_success() {
        let output = Arc::new(RecordingOutput::new());
        let d = dispatcher(output.clone(), false);
        d.configure(HashMap::from([("s".into(), cfg("/s"))]));
        assert!(d.log_checked("s", event(json!({"a": 1}))).is_ok());
        assert_eq!(output.calls().len(), 1);
    }

    #[test]
    fn log_checked_on_unregistered_stream_defers_and_returns_ok() {
        let output = Arc::new(RecordingOutput::new());
        let d = dispatcher(output.clone(), false);
        assert!(d.log_checked("nope", event(json!({}))).is_ok());
        assert!(output.calls().is_empty());
    }

    #[test]
    fn zero_in_every_one_sampling_blocks_admission() {
        let output = Arc::new(RecordingOutput::new());
        let d = dispatcher(output.clone(), false);
        let mut filtered = cfg("/s");
        filtered.sample = SampleConfig { rate: None, one_in_every: Some(2) };
        d.configure(HashMap::from([("s".into(), filtered)]));
        // StaticAssociation always returns the same pageview id; whichever
        // side of the boundary it lands on, two identical logs agree.
        d.log("s", event(json!({"n": 1})));
        let first_len = output.calls().len();
        d.log("s", event(json!({"n": 2})));
        assert_eq!(output.calls().len(), first_len * 2);
    }
}
