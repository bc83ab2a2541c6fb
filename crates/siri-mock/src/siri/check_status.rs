//! SIRI CheckStatus: the administrative request used to probe a peer.

use chrono::{DateTime, SecondsFormat, Utc};
use sxd_document::parser;
use sxd_xpath::{evaluate_xpath, Value};

/// Marker identifying a CheckStatus request body
pub const CHECK_STATUS_MARKER: &str = "sw:CheckStatus";

/// Fixed values of the synthetic CheckStatus reply
pub const RESPONSE_TIMESTAMP: &str = "2016-09-22T07:58:34.000+02:00";
pub const PRODUCER_REF: &str = "NINOXE:default";
pub const RESPONSE_MESSAGE_IDENTIFIER: &str = "c464f588-5128-46c8-ac3f-8b8a465692ab";
pub const SERVICE_STARTED_TIME: &str = "2016-09-22T03:30:32.000+02:00";

/// Whether a request body is a CheckStatus request
pub fn is_check_status(body: &str) -> bool {
    body.contains(CHECK_STATUS_MARKER)
}

/// Build the CheckStatus reply returned by the mock.
///
/// `address` is echoed as the producer address and `request_message_ref` as
/// the cross-reference to the request. An absent reference yields an empty
/// `RequestMessageRef` element.
pub fn check_status_response(address: &str, request_message_ref: Option<&str>) -> String {
    let request_message_ref = request_message_ref.unwrap_or_default();
    format!(
        r#"<?xml version='1.0' encoding='utf-8'?>
<S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/">
  <S:Body>
    <ns8:CheckStatusResponse xmlns:ns3="http://www.siri.org.uk/siri"
                             xmlns:ns4="http://www.ifopt.org.uk/acsb"
                             xmlns:ns5="http://www.ifopt.org.uk/ifopt"
                             xmlns:ns6="http://datex2.eu/schema/2_0RC1/2_0"
                             xmlns:ns7="http://scma/siri"
                             xmlns:ns8="http://wsdl.siri.org.uk"
                             xmlns:ns9="http://wsdl.siri.org.uk/siri">
      <CheckStatusAnswerInfo>
        <ns3:ResponseTimestamp>{RESPONSE_TIMESTAMP}</ns3:ResponseTimestamp>
        <ns3:ProducerRef>{PRODUCER_REF}</ns3:ProducerRef>
        <ns3:Address>{address}</ns3:Address>
        <ns3:ResponseMessageIdentifier>{RESPONSE_MESSAGE_IDENTIFIER}</ns3:ResponseMessageIdentifier>
        <ns3:RequestMessageRef>{request_message_ref}</ns3:RequestMessageRef>
      </CheckStatusAnswerInfo>
      <Answer>
        <ns3:Status>true</ns3:Status>
        <ns3:ServiceStartedTime>{SERVICE_STARTED_TIME}</ns3:ServiceStartedTime>
      </Answer>
    </ns8:CheckStatusResponse>
  </S:Body>
</S:Envelope>"#
    )
}

/// Outbound CheckStatus request
#[derive(Debug, Clone)]
pub struct CheckStatusRequest {
    pub requestor_ref: String,
    pub message_identifier: String,
    pub timestamp: DateTime<Utc>,
}

impl CheckStatusRequest {
    /// Create a request with a fresh message identifier
    pub fn new(requestor_ref: impl Into<String>) -> Self {
        Self {
            requestor_ref: requestor_ref.into(),
            message_identifier: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Render the SOAP envelope
    pub fn to_xml(&self) -> String {
        format!(
            r#"<?xml version='1.0' encoding='utf-8'?>
<S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/">
  <S:Body>
    <sw:CheckStatus xmlns:sw="http://wsdl.siri.org.uk" xmlns:siri="http://www.siri.org.uk/siri">
      <Request>
        <siri:RequestTimestamp>{}</siri:RequestTimestamp>
        <siri:RequestorRef>{}</siri:RequestorRef>
        <siri:MessageIdentifier>{}</siri:MessageIdentifier>
      </Request>
      <RequestExtension/>
    </sw:CheckStatus>
  </S:Body>
</S:Envelope>"#,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, false),
            self.requestor_ref,
            self.message_identifier,
        )
    }
}

/// Parsed CheckStatus reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckStatusResponse {
    pub status: bool,
    pub producer_ref: Option<String>,
    pub address: Option<String>,
    pub response_message_identifier: Option<String>,
    pub request_message_ref: Option<String>,
    pub service_started_time: Option<String>,
}

impl CheckStatusResponse {
    /// Parse a SOAP CheckStatus reply.
    ///
    /// Returns `None` when the body is not XML or holds no `CheckStatusResponse`.
    pub fn parse(body: &str) -> Option<Self> {
        let package = parser::parse(body).ok()?;
        let document = package.as_document();

        let text = |name: &str| -> Option<String> {
            let xpath = format!("//*[local-name()='CheckStatusResponse']//*[local-name()='{name}']");
            match evaluate_xpath(&document, &xpath).ok()? {
                Value::Nodeset(nodes) => nodes
                    .document_order_first()
                    .map(|node| node.string_value().trim().to_string()),
                _ => None,
            }
        };

        let has_response = matches!(
            evaluate_xpath(&document, "count(//*[local-name()='CheckStatusResponse'])"),
            Ok(Value::Number(n)) if n > 0.0
        );
        if !has_response {
            return None;
        }

        Some(Self {
            status: text("Status").is_some_and(|s| s == "true"),
            producer_ref: text("ProducerRef"),
            address: text("Address"),
            response_message_identifier: text("ResponseMessageIdentifier"),
            request_message_ref: text("RequestMessageRef"),
            service_started_time: text("ServiceStartedTime"),
        })
    }
}
