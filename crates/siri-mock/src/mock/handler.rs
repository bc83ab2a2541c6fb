//! HTTP request handling for mock servers.

use super::core::MockServer;
use super::response::{build_response, soap_fault_response, xml_response};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Handle a request to a mock server
pub async fn handle_mock_request(
    req: Request<Incoming>,
    server: Arc<MockServer>,
    client_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    if !server.endpoint().mounts(&path) {
        debug!(
            "Mock '{}' ignoring {} {} outside {}",
            server.name(),
            method,
            path,
            server.path()
        );
        return Ok(build_response(
            StatusCode::NOT_FOUND,
            "text/plain",
            format!("No mock mounted on {path}"),
        ));
    }

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                v.to_str().unwrap_or("").to_string(),
            )
        })
        .collect();

    let body = match req.into_body().collect().await {
        Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).to_string(),
        Err(e) => {
            warn!("Mock '{}' failed to read request body: {}", server.name(), e);
            return Ok(build_response(
                StatusCode::BAD_REQUEST,
                "text/plain",
                format!("Failed to read request body: {e}"),
            ));
        }
    };

    match server.respond(
        &client_addr.to_string(),
        &method,
        &path,
        query.as_deref(),
        headers,
        body,
    ) {
        Ok(reply) => Ok(xml_response(StatusCode::OK, reply.into_body())),
        Err(e) => {
            warn!("{}", e);
            Ok(soap_fault_response(&e.to_string()))
        }
    }
}
