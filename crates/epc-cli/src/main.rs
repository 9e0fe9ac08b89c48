//! epc-cli: wires the dispatcher, association controller, and output
//! buffer directly (without the root `epc` facade) against a
//! stdout-printing transport, to demonstrate the subsystems composing.

use async_trait::async_trait;
use epc_core::testkit::{FixedClock, InMemoryStore, SequentialRandomSource, StaticDnt};
use epc_core::StreamDispatcher;
use epc_association::AssociationController;
use epc_domain::{Event, StreamConfig};
use epc_output::{HttpTransport, OutputBuffer};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

struct StdoutTransport;

#[async_trait]
impl HttpTransport for StdoutTransport {
    async fn post(&self, url: &str, body: &str) {
        println!("POST {url}\n  {body}");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let store = Arc::new(InMemoryStore::new());
    let random = Arc::new(SequentialRandomSource::new());
    let association: Arc<dyn epc_core::Association> =
        Arc::new(AssociationController::new(store, random.clone(), None));
    let output = OutputBuffer::new(Arc::new(StdoutTransport), 10, 2000);
    let sink: Arc<dyn epc_core::OutputSink> = output.clone();

    let dispatcher = StreamDispatcher::new(
        Arc::new(FixedClock::new("2024-01-01T00:00:00Z")),
        random,
        Arc::new(StaticDnt::new(false)),
        association,
        sink,
    );

    dispatcher.log("edit", Event::new(json!({"page": "/home"}).as_object().unwrap().clone()));
    println!("logged before configure — deferred");

    dispatcher.configure(HashMap::from([
        ("edit".to_string(), StreamConfig { destination: Some("/intake/edit".into()), ..Default::default() }),
        (
            "edit.growth".to_string(),
            StreamConfig { destination: Some("/intake/edit-growth".into()), ..Default::default() },
        ),
    ]));

    dispatcher.log("edit", Event::new(json!({"page": "/second"}).as_object().unwrap().clone()));

    output.send_all_scheduled();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
}
