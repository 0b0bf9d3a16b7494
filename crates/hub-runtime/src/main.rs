//! # Message Hub Runtime
//!
//! Process entry point: loads a module-graph configuration, builds and starts
//! the hub, and runs until interrupted.
//!
//! ## Startup Sequence
//!
//! 1. Initialize structured logging (`RUST_LOG` controls the filter)
//! 2. Load configuration (first argument, or `HUB_CONFIG`, or `hub.json`)
//! 3. Build the module graph (create + register + wire)
//! 4. Start modules
//! 5. Run until ctrl-c, then tear down gracefully

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hub_runtime::{Runtime, RuntimeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("HUB_CONFIG").ok())
        .unwrap_or_else(|| "hub.json".to_string());

    info!("===========================================");
    info!("  Message Hub Runtime v0.1.0");
    info!("===========================================");
    info!("loading configuration from {path}");

    let config = RuntimeConfig::from_file(&path)
        .with_context(|| format!("failed to load configuration from {path}"))?;
    let runtime = Runtime::build(config)
        .await
        .context("failed to build the module graph")?;
    runtime.start().await.context("failed to start modules")?;

    info!("hub running; press ctrl-c to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for the shutdown signal")?;

    info!("shutting down");
    runtime.shutdown().await;
    Ok(())
}
