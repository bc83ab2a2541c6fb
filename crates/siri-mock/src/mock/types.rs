//! Type definitions for the mock SIRI server.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

// ============================================================================
// Captured traffic
// ============================================================================

/// Request captured by a mock server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedRequest {
    pub request_from: String,
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: String,
    /// `MessageIdentifier` values found in the body, in document order
    pub message_identifiers: Vec<String>,
    pub timestamp: String,
}

impl CapturedRequest {
    /// First message identifier of the request
    pub fn first_message_identifier(&self) -> Option<&str> {
        self.message_identifiers.first().map(String::as_str)
    }

    /// Last message identifier of the request (the first one when not batched)
    pub fn last_message_identifier(&self) -> Option<&str> {
        self.message_identifiers.last().map(String::as_str)
    }
}

/// Canned response waiting in the queue of a mock server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingResponse {
    /// SIRI request type the response is meant for. Informational only:
    /// responses are served strictly in the order they were queued.
    pub request_type: String,
    /// Response body, possibly holding correlation placeholders
    pub template: String,
}

/// Outcome of handling an inbound body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Synthetic reply to a CheckStatus request, which is never captured
    CheckStatus(String),
    /// Queued template rendered for the captured request
    Queued(String),
}

impl MockReply {
    pub fn body(&self) -> &str {
        match self {
            MockReply::CheckStatus(body) | MockReply::Queued(body) => body,
        }
    }

    pub fn into_body(self) -> String {
        match self {
            MockReply::CheckStatus(body) | MockReply::Queued(body) => body,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Bounded wait used by `wait_request`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl WaitPolicy {
    pub const DEFAULT_ATTEMPTS: u32 = 10;
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Total time `wait_request` may block
    pub fn timeout(&self) -> Duration {
        self.interval.saturating_mul(self.attempts)
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS, Self::DEFAULT_INTERVAL)
    }
}

/// Where a mock server listens, parsed from its URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockEndpoint {
    pub url: String,
    pub host: String,
    pub port: u16,
    /// Mount path, without trailing slash (except for the root path)
    pub path: String,
}

impl MockEndpoint {
    /// Parse an `http://host:port/path` URL
    pub fn parse(url: &str) -> Result<Self, MockError> {
        let invalid = |reason: &str| MockError::InvalidUrl(url.to_string(), reason.to_string());

        let uri: hyper::Uri = url
            .parse()
            .map_err(|e: hyper::http::uri::InvalidUri| invalid(&e.to_string()))?;

        match uri.scheme_str() {
            Some("http") => {}
            Some(other) => return Err(invalid(&format!("unsupported scheme '{other}'"))),
            None => return Err(invalid("missing scheme")),
        }

        let host = uri.host().ok_or_else(|| invalid("missing host"))?;
        // Bracketed IPv6 literals bind without their brackets
        let host = host.trim_start_matches('[').trim_end_matches(']').to_string();
        let port = uri.port_u16().unwrap_or(80);

        let path = match uri.path().trim_end_matches('/') {
            "" => "/".to_string(),
            p => p.to_string(),
        };

        Ok(Self {
            url: url.to_string(),
            host,
            port,
            path,
        })
    }

    /// Whether `path` falls under the mount path
    pub fn mounts(&self, path: &str) -> bool {
        if self.path == "/" {
            return true;
        }
        match path.strip_prefix(self.path.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// URL of the endpoint once bound to `addr` (resolves port 0)
    pub fn url_for(&self, addr: SocketAddr) -> String {
        if self.port != 0 {
            return self.url.clone();
        }
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!("http://{}:{}{}", host, addr.port(), self.path)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MockError {
    #[error("Invalid mock server URL '{0}': {1}")]
    InvalidUrl(String, String),
    #[error("No mock server named '{0}'")]
    NotFound(String),
    #[error("Failed to bind {0}: {1}")]
    BindError(String, String),
    #[error("Received {received} request(s), expected {expected} {request_type} request(s)")]
    RequestLimitExceeded {
        request_type: String,
        expected: usize,
        received: usize,
    },
    #[error("Mock server '{0}' received a request with no response queued")]
    ResponseQueueUnderflow(String),
}
