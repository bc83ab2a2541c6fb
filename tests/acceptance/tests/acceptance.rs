//! Cucumber acceptance tests for the mock SIRI server
//!
//! Run with: cargo test --test acceptance

use cucumber::World;
use siri_mock_acceptance::world::AcceptanceWorld;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    AcceptanceWorld::cucumber()
        .max_concurrent_scenarios(1)
        .before(|_feature, _rule, scenario, _world| {
            Box::pin(async move {
                tracing::info!("Starting scenario: {}", scenario.name);
            })
        })
        .after(|_feature, _rule, scenario, _ev, world| {
            Box::pin(async move {
                tracing::info!("Finished scenario: {}", scenario.name);
                // No listener outlives its scenario
                if let Some(w) = world {
                    w.registry.stop_all().await;
                }
            })
        })
        .run_and_exit("features")
        .await;
}
