//! siri-mock CLI
//!
//! Usage:
//!   siri-mock serve --config mock.yaml
//!   siri-mock check http://localhost:8090/siri

use anyhow::Context;
use clap::{Parser, Subcommand};
use siri_mock::config::MockConfig;
use siri_mock::siri::CheckStatusClient;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "siri-mock")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the mock servers described in a configuration file
    Serve {
        /// YAML configuration file
        #[arg(short, long, env = "SIRI_MOCK_CONFIG")]
        config: PathBuf,

        /// Log every captured request body
        #[arg(long, env = "SIRI_DEBUG")]
        debug_requests: bool,
    },
    /// Send a SIRI CheckStatus request and report the partner status
    Check {
        /// SIRI endpoint URL
        url: String,

        /// RequestorRef sent with the request
        #[arg(long, default_value = "siri-mock")]
        requestor_ref: String,

        /// Request timeout in seconds
        #[arg(short, long, default_value = "9")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let result = match args.command {
        Command::Serve {
            config,
            debug_requests,
        } => serve(config, debug_requests).await,
        Command::Check {
            url,
            requestor_ref,
            timeout,
        } => check(&url, &requestor_ref, Duration::from_secs(timeout)).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn serve(config_path: PathBuf, debug_requests: bool) -> anyhow::Result<()> {
    let mut config = MockConfig::from_file(&config_path)?;
    config.debug_requests |= debug_requests;

    let registry = config.build_registry()?;
    for name in registry.names() {
        let server = registry.find(&name)?;
        if let Err(e) = server.start().await {
            registry.stop_all().await;
            return Err(e).with_context(|| format!("Failed to start mock '{name}'"));
        }
    }

    info!(
        "{} mock server(s) running, press Ctrl-C to stop",
        registry.len()
    );
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    registry.stop_all().await;
    Ok(())
}

async fn check(url: &str, requestor_ref: &str, timeout: Duration) -> anyhow::Result<()> {
    let client = CheckStatusClient::new(requestor_ref, timeout)?;
    let response = client
        .check_status(url)
        .await
        .with_context(|| format!("CheckStatus on {url} failed"))?;

    if !response.status {
        anyhow::bail!("SIRI CRITICAL: {url} reports Status=false");
    }

    info!(
        "SIRI OK: {} (producer {}, started {})",
        url,
        response.producer_ref.as_deref().unwrap_or("-"),
        response.service_started_time.as_deref().unwrap_or("-")
    );
    Ok(())
}
