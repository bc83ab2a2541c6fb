//! Given step definitions

use crate::world::AcceptanceWorld;
use cucumber::{gherkin::Step, given};

#[given(expr = "a SIRI server {string} on {string}")]
async fn siri_server_on(world: &mut AcceptanceWorld, name: String, url: String) {
    let server = world
        .registry
        .create(&name, &url)
        .expect("Failed to create SIRI server");
    server.start().await.expect("Failed to start SIRI server");
}

#[given(expr = "the SIRI server {string} expects a {string} request with response:")]
async fn siri_server_expects(
    world: &mut AcceptanceWorld,
    name: String,
    request_type: String,
    step: &Step,
) {
    let response = step.docstring().expect("Missing docstring").trim().to_string();
    world.server(&name).expect_request(request_type, response);
}
