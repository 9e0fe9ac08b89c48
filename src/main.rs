//! Demo binary wiring a [`epc::Client`] against the default providers and a
//! local `reqwest` transport, for manual smoke-testing.

use epc::{Client, ClientConfig};
use epc_infra::{JsonFileStore, ReqwestHttpTransport};
use epc_providers::{OsRandomSource, SystemClock, ToggleDoNotTrack};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let client = Client::new(
        ClientConfig::default(),
        Arc::new(JsonFileStore::from_env()),
        Arc::new(SystemClock),
        Arc::new(OsRandomSource),
        Arc::new(ToggleDoNotTrack::new(false)),
        Arc::new(ReqwestHttpTransport::default()),
    );

    client.configure(HashMap::from([(
        "demo.pageview".to_string(),
        epc_domain::StreamConfig { destination: Some("https://example.invalid/intake".into()), ..Default::default() },
    )]));

    client.log("demo.pageview", json!({"page": "/home"}).as_object().unwrap().clone());

    client.flush();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    tracing::info!("demo complete");
}
