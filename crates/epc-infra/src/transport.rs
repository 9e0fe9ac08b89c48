//! `ReqwestHttpTransport`: the concrete `HttpTransport` used outside of
//! tests.

use async_trait::async_trait;
use epc_output::HttpTransport;

pub struct ReqwestHttpTransport {
    client: reqwest::Client,
}

impl Default for ReqwestHttpTransport {
    fn default() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl ReqwestHttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn post(&self, url: &str, body: &str) {
        let result = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await;

        if let Err(err) = result {
            tracing::warn!(url, error = %err, "output POST failed; item already removed from the queue");
        }
    }
}
