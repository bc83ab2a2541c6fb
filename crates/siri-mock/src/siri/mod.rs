//! SIRI wire helpers used by the mock and its probes.
//!
//! - `correlation`: message identifier extraction
//! - `check_status`: CheckStatus request/reply shapes
//! - `client`: SOAP client issuing CheckStatus requests

mod check_status;
mod client;
mod correlation;

pub use check_status::{
    check_status_response, is_check_status, CheckStatusRequest, CheckStatusResponse,
    CHECK_STATUS_MARKER, PRODUCER_REF, RESPONSE_MESSAGE_IDENTIFIER, RESPONSE_TIMESTAMP,
    SERVICE_STARTED_TIME,
};
pub use client::{CheckStatusClient, CheckStatusError, DEFAULT_CHECK_STATUS_TIMEOUT};
pub use correlation::extract_message_identifiers;

/// Content type of every SOAP message exchanged with the mock
pub const XML_CONTENT_TYPE: &str = "text/xml";
