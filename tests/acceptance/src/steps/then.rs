//! Then step definitions

use crate::world::AcceptanceWorld;
use cucumber::{gherkin::Step, then};
use siri_mock::siri::CheckStatusResponse;

#[then(expr = "the SIRI server {string} should have received {int} {string} request(s)")]
async fn check_received(world: &mut AcceptanceWorld, name: String, count: usize, request_type: String) {
    let server = world.server(&name);
    server
        .wait_request(&request_type, count)
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert!(
        server.received_requests(count),
        "SIRI server {name} received {} request(s), expected {count}",
        server.request_count()
    );
}

#[then(expr = "the SIRI server {string} should not have received a request")]
async fn check_not_received(world: &mut AcceptanceWorld, name: String) {
    assert!(!world.server(&name).received_request());
}

#[then(expr = "the SIRI server {string} should still have {int} queued response(s)")]
async fn check_queued(world: &mut AcceptanceWorld, name: String, count: usize) {
    assert_eq!(world.server(&name).pending_responses().len(), count);
}

#[then(expr = "waiting for {int} {string} request(s) on the SIRI server {string} should fail")]
async fn check_wait_fails(
    world: &mut AcceptanceWorld,
    count: usize,
    request_type: String,
    name: String,
) {
    let result = world.server(&name).wait_request(&request_type, count).await;
    let err = result.expect_err("wait_request should have timed out");
    world.last_error = Some(err);
}

#[then(expr = "the wait error should be {string}")]
async fn check_wait_error(world: &mut AcceptanceWorld, message: String) {
    let err = world.last_error.as_ref().expect("No error recorded");
    assert_eq!(err.to_string(), message);
}

#[then(expr = "the response status should be {int}")]
async fn check_status(world: &mut AcceptanceWorld, status: u16) {
    assert_eq!(world.last_response().status, status);
}

#[then(expr = "the response content type should be {string}")]
async fn check_content_type(world: &mut AcceptanceWorld, content_type: String) {
    assert_eq!(world.last_response().content_type, content_type);
}

#[then(expr = "the response body should be:")]
async fn check_body(world: &mut AcceptanceWorld, step: &Step) {
    let expected = step.docstring().expect("Missing docstring").trim();
    assert_eq!(world.last_response().body.trim(), expected);
}

#[then(expr = "the response body should contain {string}")]
async fn check_body_contains(world: &mut AcceptanceWorld, fragment: String) {
    let body = &world.last_response().body;
    assert!(body.contains(&fragment), "{fragment:?} not found in:\n{body}");
}

#[then(expr = "the CheckStatus response should reference {string} with status {word}")]
async fn check_status_response(world: &mut AcceptanceWorld, reference: String, status: String) {
    let response = CheckStatusResponse::parse(&world.last_response().body)
        .expect("Response is not a CheckStatusResponse");
    assert_eq!(response.request_message_ref.as_deref(), Some(reference.as_str()));
    assert_eq!(response.status.to_string(), status);
}

#[then(expr = "no SIRI server {string} should exist")]
async fn check_not_registered(world: &mut AcceptanceWorld, name: String) {
    assert!(world.registry.find(&name).is_err());
    assert!(world.registry.is_empty());
}
