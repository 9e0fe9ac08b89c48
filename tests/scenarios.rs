//! End-to-end scenarios (spec §8) against `epc::Client`.

use async_trait::async_trait;
use epc::{Client, ClientConfig};
use epc_core::testkit::{FixedClock, InMemoryStore, SequentialRandomSource, StaticDnt};
use epc_domain::StreamConfig;
use epc_output::HttpTransport;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingTransport {
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn post(&self, url: &str, body: &str) {
        self.calls.lock().unwrap().push((url.to_string(), body.to_string()));
    }
}

impl RecordingTransport {
    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

fn build(dnt: bool) -> (Client<RecordingTransport>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let client = Client::new(
        ClientConfig::default(),
        Arc::new(InMemoryStore::new()),
        Arc::new(FixedClock::new("2024-01-01T00:00:00Z")),
        Arc::new(SequentialRandomSource::new()),
        Arc::new(StaticDnt::new(dnt)),
        transport.clone(),
    );
    (client, transport)
}

fn cfg(destination: &str) -> StreamConfig {
    StreamConfig { destination: Some(destination.into()), ..Default::default() }
}

#[tokio::test]
async fn scenario_1_deferral_then_drain() {
    let (client, transport) = build(false);
    client.log("edit", json!({"a": 1}).as_object().unwrap().clone());
    tokio::task::yield_now().await;
    assert!(transport.calls().is_empty());

    client.configure(HashMap::from([(
        "edit".into(),
        StreamConfig { destination: Some("/l".into()), schema: Some("/s".into()), scope: epc_domain::Scope::Session, ..Default::default() },
    )]));
    tokio::task::yield_now().await;

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "/l");
    assert!(calls[0].1.contains("\"a\":1"));
    assert!(calls[0].1.contains("\"stream\":\"edit\""));
    assert!(calls[0].1.contains("\"pageview_id\""));
    assert!(calls[0].1.contains("\"session_id\""));
    assert!(calls[0].1.contains("\"activity_id\""));
    assert!(calls[0].1.contains("\"$schema\":\"/s\""));
}

#[tokio::test]
async fn scenario_2_cascade() {
    let (client, transport) = build(false);
    client.configure(HashMap::from([("edit".into(), cfg("/e")), ("edit.growth".into(), cfg("/g"))]));
    client.log("edit", json!({"x": 1}).as_object().unwrap().clone());
    tokio::task::yield_now().await;

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    let destinations: Vec<&str> = calls.iter().map(|(u, _)| u.as_str()).collect();
    assert!(destinations.contains(&"/e"));
    assert!(destinations.contains(&"/g"));
    for (_, body) in &calls {
        assert!(body.contains("\"x\":1"));
    }
}

#[tokio::test]
async fn scenario_3_do_not_track_blocks_public_stream() {
    let (client, transport) = build(true);
    client.configure(HashMap::from([("s".into(), cfg("/s"))]));
    client.log("s", json!({}).as_object().unwrap().clone());
    tokio::task::yield_now().await;
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn scenario_4_private_stream_under_dnt_omits_identity_fields() {
    let (client, transport) = build(true);
    let mut private = cfg("/s");
    private.is_private = true;
    client.configure(HashMap::from([("s".into(), private)]));
    client.log("s", json!({}).as_object().unwrap().clone());
    tokio::task::yield_now().await;

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].1.contains("pageview_id"));
    assert!(!calls[0].1.contains("session_id"));
    assert!(!calls[0].1.contains("activity_id"));
}

#[tokio::test]
async fn scenario_5_burst_threshold() {
    let (client, transport) = build(false);
    client.configure(HashMap::from([("s".into(), cfg("/s"))]));
    for i in 0..10 {
        client.log("s", json!({"n": i}).as_object().unwrap().clone());
    }
    tokio::task::yield_now().await;
    assert_eq!(transport.calls().len(), 10);
}

#[tokio::test]
async fn scenario_6_disable_then_enable_releases_backlog_in_order() {
    let (client, transport) = build(false);
    client.configure(HashMap::from([("s".into(), cfg("/s"))]));

    client.disable_sending();
    for i in 0..5 {
        client.log("s", json!({"n": i}).as_object().unwrap().clone());
    }
    tokio::task::yield_now().await;
    assert!(transport.calls().is_empty());

    client.enable_sending();
    tokio::task::yield_now().await;
    let calls = transport.calls();
    assert_eq!(calls.len(), 5);
    for (i, (_, body)) in calls.iter().enumerate() {
        assert!(body.contains(&format!("\"n\":{i}")));
    }
}

#[tokio::test]
async fn scenario_7_session_reset_restarts_activity_sequence() {
    let (client, transport) = build(false);
    client.configure(HashMap::from([("s".into(), cfg("/s"))]));

    client.log("s", json!({}).as_object().unwrap().clone());
    tokio::task::yield_now().await;
    let first_body = transport.calls()[0].1.clone();

    client.begin_new_session();
    client.log("s", json!({}).as_object().unwrap().clone());
    tokio::task::yield_now().await;
    let second_body = transport.calls()[1].1.clone();

    assert!(first_body.contains("\"activity_id\""));
    assert!(second_body.contains("\"activity_id\""));
    assert_ne!(first_body, second_body);
}
