//! SOAP client for SIRI CheckStatus probes.

use super::check_status::{CheckStatusRequest, CheckStatusResponse};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// CheckStatus timeout used by SIRI partners
pub const DEFAULT_CHECK_STATUS_TIMEOUT: Duration = Duration::from_secs(9);

#[derive(Debug, thiserror::Error)]
pub enum CheckStatusError {
    #[error("CheckStatus request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("SIRI CRITICAL: HTTP status {0}")]
    Status(u16),
    #[error("SIRI CRITICAL: HTTP Content-Type {0}")]
    ContentType(String),
    #[error("SIRI CRITICAL: reply is not a CheckStatusResponse")]
    UnexpectedBody,
}

/// Issues CheckStatus requests against a SIRI endpoint
#[derive(Debug, Clone)]
pub struct CheckStatusClient {
    client: Client,
    requestor_ref: String,
}

impl CheckStatusClient {
    /// Create a client identifying itself as `requestor_ref`
    pub fn new(requestor_ref: impl Into<String>, timeout: Duration) -> Result<Self, CheckStatusError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            requestor_ref: requestor_ref.into(),
        })
    }

    /// Send a CheckStatus request to `url` and parse the reply.
    ///
    /// Fails unless the reply is HTTP 200 with an XML content type and a
    /// CheckStatusResponse body. A reply with `Status=false` is returned as is.
    pub async fn check_status(&self, url: &str) -> Result<CheckStatusResponse, CheckStatusError> {
        let request = CheckStatusRequest::new(&self.requestor_ref);
        debug!(
            "Sending CheckStatus {} to {}",
            request.message_identifier, url
        );

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(request.to_xml())
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(CheckStatusError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("text/xml") {
            return Err(CheckStatusError::ContentType(content_type));
        }

        let body = response.text().await?;
        CheckStatusResponse::parse(&body).ok_or(CheckStatusError::UnexpectedBody)
    }
}
