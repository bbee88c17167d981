//! Payment-terminal device simulator binary.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: DEVICE_1 against http://localhost:8080
//! payterm-sim
//!
//! # Explicit device and gateway, auto-verify enabled
//! payterm-sim --id TERMINAL_7 --gateway https://gw.example --auto-verify
//!
//! # Configure logging level
//! RUST_LOG=debug payterm-sim
//! ```
//!
//! # Environment Variables
//!
//! Loaded from a local `.env` file when present. `DEVICE_ID`,
//! `GATEWAY_BASE`, `WS_PATH`, `AUTO_VERIFY`, `VERIFY_DELAY_MS`,
//! `VERIFIER_TX_PREFIX`, `DEFAULT_AMOUNT`, `DEFAULT_CURRENCY` — see
//! [`payterm_sim::config`] for precedence. `RUST_LOG` sets the log level
//! filter (default: `info`).

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use payterm_sim::config::{Cli, RunConfig};
use payterm_sim::console;
use payterm_sim::gateway::GatewayClient;
use payterm_sim::realtime;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Terminal simulator failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Arc::new(RunConfig::resolve(&cli, |name| std::env::var(name).ok()));
    tracing::info!(
        device = %config.device_id,
        gateway = %config.gateway_base,
        auto_verify = config.auto_verify,
        "Resolved configuration"
    );

    let gateway = GatewayClient::new(&config)?;
    let realtime = realtime::connect(&config).await?;

    console::run(config, gateway, realtime).await;
    Ok(())
}
