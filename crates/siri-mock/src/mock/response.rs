//! HTTP response construction for the mock server.

use crate::siri::XML_CONTENT_TYPE;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};

/// Build a response with a content type.
///
/// Falls back to a bare 500 if the builder rejects its input.
pub fn build_response(
    status: StatusCode,
    content_type: &str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| {
            let mut response = Response::new(Full::new(Bytes::from("Internal Server Error")));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
}

/// `text/xml` response
pub fn xml_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    build_response(status, XML_CONTENT_TYPE, body)
}

/// SOAP 1.1 server fault, returned with HTTP 500
pub fn soap_fault_response(message: &str) -> Response<Full<Bytes>> {
    xml_response(StatusCode::INTERNAL_SERVER_ERROR, soap_fault(message))
}

/// Render a SOAP 1.1 `Fault` envelope
pub fn soap_fault(message: &str) -> String {
    format!(
        r#"<?xml version='1.0' encoding='utf-8'?>
<S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/">
  <S:Body>
    <S:Fault>
      <faultcode>S:Server</faultcode>
      <faultstring>{}</faultstring>
    </S:Fault>
  </S:Body>
</S:Envelope>"#,
        escape_xml(message)
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
