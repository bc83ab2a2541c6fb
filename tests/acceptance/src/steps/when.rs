//! When step definitions

use crate::world::AcceptanceWorld;
use cucumber::{gherkin::Step, when};
use siri_mock::siri::CheckStatusRequest;

fn stop_monitoring_request(identifiers: &[&str]) -> String {
    let infos: String = identifiers
        .iter()
        .map(|id| {
            format!(
                "
      <ServiceRequestInfo>
        <siri:RequestorRef>edwig</siri:RequestorRef>
        <siri:MessageIdentifier>{id}</siri:MessageIdentifier>
      </ServiceRequestInfo>"
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/">
  <S:Body>
    <sw:GetStopMonitoring xmlns:sw="http://wsdl.siri.org.uk" xmlns:siri="http://www.siri.org.uk/siri">{infos}
    </sw:GetStopMonitoring>
  </S:Body>
</S:Envelope>"#
    )
}

#[when(expr = "a SIRI request with message identifier {string} is sent to the SIRI server {string}")]
async fn send_request(world: &mut AcceptanceWorld, identifier: String, name: String) {
    world
        .post_to(&name, stop_monitoring_request(&[&identifier]))
        .await;
}

#[when(
    expr = "a SIRI request with message identifiers {string} and {string} is sent to the SIRI server {string}"
)]
async fn send_batched_request(
    world: &mut AcceptanceWorld,
    first: String,
    last: String,
    name: String,
) {
    world
        .post_to(&name, stop_monitoring_request(&[&first, &last]))
        .await;
}

#[when(expr = "a SIRI CheckStatus request with message identifier {string} is sent to the SIRI server {string}")]
async fn send_check_status(world: &mut AcceptanceWorld, identifier: String, name: String) {
    let mut request = CheckStatusRequest::new("edwig");
    request.message_identifier = identifier;
    world.post_to(&name, request.to_xml()).await;
}

#[when(expr = "the following SIRI request is sent to the SIRI server {string}:")]
async fn send_raw_request(world: &mut AcceptanceWorld, name: String, step: &Step) {
    let body = step.docstring().expect("Missing docstring").trim().to_string();
    world.post_to(&name, body).await;
}

#[when(expr = "all SIRI servers are stopped")]
async fn stop_all(world: &mut AcceptanceWorld) {
    world.registry.stop_all().await;
}
