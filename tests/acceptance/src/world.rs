//! Test world containing shared state for cucumber tests

use cucumber::World;
use reqwest::Client;
use siri_mock::mock::{MockError, MockRegistry, MockServer, WaitPolicy};
use std::sync::Arc;
use std::time::Duration;

/// Last HTTP exchange with a mock server
#[derive(Debug, Clone)]
pub struct LastResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

/// The test world containing all shared state
#[derive(Debug, World)]
pub struct AcceptanceWorld {
    /// Mock servers of the current scenario
    pub registry: Arc<MockRegistry>,

    /// HTTP client standing in for the system under test
    pub client: Client,

    /// Last response received from a mock server
    pub last_response: Option<LastResponse>,

    /// Last error raised by a wait step
    pub last_error: Option<MockError>,
}

impl AcceptanceWorld {
    pub fn new() -> Self {
        let registry = MockRegistry::new()
            .with_wait_policy(WaitPolicy::new(10, Duration::from_millis(100)));

        Self {
            registry: Arc::new(registry),
            client: Client::new(),
            last_response: None,
            last_error: None,
        }
    }

    pub fn server(&self, name: &str) -> Arc<MockServer> {
        self.registry
            .find(name)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// POST a SOAP body to a mock server and remember the response
    pub async fn post_to(&mut self, name: &str, body: String) {
        let url = self.server(name).url();
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "text/xml; charset=utf-8")
            .body(body)
            .send()
            .await
            .unwrap_or_else(|e| panic!("Request to {url} failed: {e}"));

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await.unwrap_or_default();

        self.last_response = Some(LastResponse {
            status,
            content_type,
            body,
        });
    }

    pub fn last_response(&self) -> &LastResponse {
        self.last_response.as_ref().expect("No response recorded")
    }
}

impl Default for AcceptanceWorld {
    fn default() -> Self {
        Self::new()
    }
}
