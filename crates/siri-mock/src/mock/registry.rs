//! MockRegistry - named collection of mock servers.
//!
//! The registry owns every mock server of a test run. Test steps look servers
//! up by name; the after-scenario hook tears them all down with `stop_all`.

use super::core::MockServer;
use super::types::{MockError, WaitPolicy};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Named mock servers
#[derive(Debug, Default)]
pub struct MockRegistry {
    servers: RwLock<HashMap<String, Arc<MockServer>>>,
    /// Applied to servers created by this registry
    wait_policy: WaitPolicy,
    debug_requests: bool,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wait_policy(mut self, wait_policy: WaitPolicy) -> Self {
        self.wait_policy = wait_policy;
        self
    }

    pub fn with_debug_requests(mut self, debug_requests: bool) -> Self {
        self.debug_requests = debug_requests;
        self
    }

    /// Return the server named `name`, creating it (stopped) if needed.
    ///
    /// An existing server is returned as is, even if `url` differs.
    pub fn create(&self, name: &str, url: &str) -> Result<Arc<MockServer>, MockError> {
        let mut servers = self.servers.write();
        if let Some(existing) = servers.get(name) {
            if existing.endpoint().url != url {
                warn!(
                    "Mock '{}' already exists on {}, ignoring {}",
                    name,
                    existing.endpoint().url,
                    url
                );
            }
            return Ok(Arc::clone(existing));
        }

        let server = Arc::new(
            MockServer::new(name, url)?
                .with_wait_policy(self.wait_policy)
                .with_debug_requests(self.debug_requests),
        );
        servers.insert(name.to_string(), Arc::clone(&server));
        info!("Mock '{}' registered for {}", name, url);
        Ok(server)
    }

    /// Get a server by name
    pub fn find(&self, name: &str) -> Result<Arc<MockServer>, MockError> {
        self.servers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| MockError::NotFound(name.to_string()))
    }

    /// Names of registered servers, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.servers.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.servers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.read().is_empty()
    }

    /// Stop every server and empty the registry.
    ///
    /// Returns the number of servers removed.
    pub async fn stop_all(&self) -> usize {
        let servers: Vec<Arc<MockServer>> = {
            let mut servers = self.servers.write();
            servers.drain().map(|(_, server)| server).collect()
        };

        for server in &servers {
            server.stop().await;
        }

        if !servers.is_empty() {
            info!("Stopped {} mock server(s)", servers.len());
        }
        servers.len()
    }
}
