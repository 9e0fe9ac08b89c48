//! epc: the public facade over the four core subsystems (spec §6).
//!
//! `Client` owns one `StreamDispatcher`, one `AssociationController`, and
//! one `OutputBuffer`, wired against whichever `Clock`/`RandomSource`/
//! `DoNotTrackSignal`/`PersistentStore`/`HttpTransport` the host supplies.
//! Per §9 "global controllers as singletons": the prototype keeps these as
//! module-level singletons; here they are fields of one owned object
//! instead, constructed once and handed to the host.

pub mod config;
pub mod error;

pub use config::ClientConfig;
pub use error::ClientError;

use epc_association::AssociationController;
use epc_core::{Association, Clock, DoNotTrackSignal, PersistentStore, RandomSource, StreamDispatcher};
use epc_domain::{Event, StreamConfig};
use epc_output::{HttpTransport, OutputBuffer};
use serde_json::Map;
use std::collections::HashMap;
use std::sync::Arc;

/// The library entry point. Generic over the transport so hosts can swap in
/// a test double without dynamic dispatch on the hot path.
pub struct Client<T: HttpTransport + 'static> {
    dispatcher: StreamDispatcher,
    association: Arc<dyn Association>,
    output: Arc<OutputBuffer<T>>,
}

impl<T: HttpTransport + 'static> Client<T> {
    /// Clamps an invalid `config.wait_items` up to 1 rather than failing —
    /// hosts that want the validation error should use [`Self::try_new`].
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn PersistentStore>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        dnt: Arc<dyn DoNotTrackSignal>,
        transport: Arc<T>,
    ) -> Self {
        let output = OutputBuffer::new(transport, config.wait_items, config.wait_ms);
        Self::from_output(config, store, clock, random, dnt, output)
    }

    /// Checked constructor (SPEC_FULL §2): rejects an invalid `ClientConfig`
    /// instead of degrading, for hosts that validate configuration up front.
    pub fn try_new(
        config: ClientConfig,
        store: Arc<dyn PersistentStore>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        dnt: Arc<dyn DoNotTrackSignal>,
        transport: Arc<T>,
    ) -> Result<Self, ClientError> {
        let output = OutputBuffer::try_new(transport, config.wait_items, config.wait_ms)?;
        Ok(Self::from_output(config, store, clock, random, dnt, output))
    }

    fn from_output(
        config: ClientConfig,
        store: Arc<dyn PersistentStore>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        dnt: Arc<dyn DoNotTrackSignal>,
        output: Arc<OutputBuffer<T>>,
    ) -> Self {
        let association: Arc<dyn Association> =
            Arc::new(AssociationController::new(store, random.clone(), config.key_prefix.clone()));
        let sink: Arc<dyn epc_core::OutputSink> = output.clone();
        let dispatcher = StreamDispatcher::new(clock, random, dnt, association.clone(), sink);
        Self { dispatcher, association, output }
    }

    /// §6 `log(stream, data)`.
    pub fn log(&self, stream: &str, data: Map<String, serde_json::Value>) {
        self.dispatcher.log(stream, Event::new(data));
    }

    /// Checked variant of [`Self::log`] (SPEC_FULL §2): surfaces a
    /// serialisation failure on `stream` itself instead of only logging it.
    /// Cascade children still swallow-and-log their own failures, same as
    /// the unchecked `log`.
    pub fn log_checked(&self, stream: &str, data: Map<String, serde_json::Value>) -> Result<(), ClientError> {
        self.dispatcher.log_checked(stream, Event::new(data))?;
        Ok(())
    }

    /// §6 `configure(config)`.
    pub fn configure(&self, config: HashMap<String, StreamConfig>) {
        self.dispatcher.configure(config);
    }

    /// §6 `begin_new_session()`.
    pub fn begin_new_session(&self) {
        self.association.begin_new_session();
    }

    /// §6 `begin_new_activity(stream)`.
    pub fn begin_new_activity(&self, stream: &str) {
        self.association.begin_new_activity(stream);
    }

    /// §6 `enable_sending()`.
    pub fn enable_sending(&self) {
        self.output.enable_sending();
    }

    /// §6 `disable_sending()`.
    pub fn disable_sending(&self) {
        self.output.disable_sending();
    }

    /// Supplemental (SPEC_FULL §4): an explicit "flush now" affordance
    /// distinct from the page-hide/background lifecycle hooks.
    pub fn flush(&self) {
        self.output.send_all_scheduled();
    }

    pub fn queue_len(&self) -> usize {
        self.output.queue_len()
    }

    pub fn is_sending_enabled(&self) -> bool {
        self.output.is_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epc_core::testkit::{FixedClock, InMemoryStore, SequentialRandomSource, StaticDnt};
    use epc_output::HttpTransport;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingTransport(Mutex<Vec<(String, String)>>);

    #[async_trait::async_trait]
    impl HttpTransport for RecordingTransport {
        async fn post(&self, url: &str, body: &str) {
            self.0.lock().unwrap().push((url.to_string(), body.to_string()));
        }
    }

    fn client() -> (Client<RecordingTransport>, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport(Mutex::new(Vec::new())));
        let client = Client::new(
            ClientConfig::default(),
            Arc::new(InMemoryStore::new()),
            Arc::new(FixedClock::new("2024-01-01T00:00:00Z")),
            Arc::new(SequentialRandomSource::new()),
            Arc::new(StaticDnt::new(false)),
            transport.clone(),
        );
        (client, transport)
    }

    #[tokio::test]
    async fn log_before_configure_is_deferred_then_delivered() {
        let (client, transport) = client();
        client.log("edit", json!({"a": 1}).as_object().unwrap().clone());
        tokio::task::yield_now().await;
        assert!(transport.0.lock().unwrap().is_empty());

        client.configure(HashMap::from([(
            "edit".into(),
            StreamConfig { destination: Some("/l".into()), ..Default::default() },
        )]));
        tokio::task::yield_now().await;

        let calls = transport.0.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "/l");
        assert!(calls[0].1.contains("\"a\":1"));
    }

    #[tokio::test]
    async fn log_checked_delivers_and_returns_ok() {
        let (client, transport) = client();
        client.configure(HashMap::from([(
            "edit".into(),
            StreamConfig { destination: Some("/l".into()), ..Default::default() },
        )]));
        assert!(client.log_checked("edit", json!({"a": 1}).as_object().unwrap().clone()).is_ok());
        tokio::task::yield_now().await;
        assert_eq!(transport.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn try_new_rejects_zero_wait_items() {
        let transport = Arc::new(RecordingTransport(Mutex::new(Vec::new())));
        let result = Client::try_new(
            ClientConfig { wait_items: 0, ..ClientConfig::default() },
            Arc::new(InMemoryStore::new()),
            Arc::new(FixedClock::new("2024-01-01T00:00:00Z")),
            Arc::new(SequentialRandomSource::new()),
            Arc::new(StaticDnt::new(false)),
            transport,
        );
        let err = match result {
            Ok(_) => panic!("expected try_new to reject wait_items == 0"),
            Err(e) => e,
        };
        assert!(matches!(err, ClientError::Output(_)));
    }

    #[tokio::test]
    async fn disable_then_enable_releases_the_backlog() {
        let (client, transport) = client();
        client.configure(HashMap::from([(
            "s".into(),
            StreamConfig { destination: Some("/s".into()), ..Default::default() },
        )]));

        client.disable_sending();
        for i in 0..5 {
            client.log("s", json!({"n": i}).as_object().unwrap().clone());
        }
        tokio::task::yield_now().await;
        assert!(transport.0.lock().unwrap().is_empty());

        client.enable_sending();
        tokio::task::yield_now().await;
        assert_eq!(transport.0.lock().unwrap().len(), 5);
    }
}
