//! # Clausia Runtime
//!
//! Document signature lifecycle with real-time notification delivery.
//!
//! Exits non-zero when configuration is invalid, the listener cannot bind,
//! or the notification pump stops.

use anyhow::{Context, Result};
use clausia_runtime::{ClausiaRuntime, RuntimeConfig};
use clausia_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{error, info};

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for Ctrl+C");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("failed to initialize logging")?;

    let config = RuntimeConfig::from_env().context("failed to load runtime configuration")?;
    config.validate().context("invalid runtime configuration")?;

    info!("===========================================");
    info!("  Clausia Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    info!("WebSocket: {}", config.ws_bind);
    info!("Sweep interval: {:?}", config.sweep.interval);
    info!("Directory entries: {}", config.signers.len());

    let runtime = ClausiaRuntime::new(config);

    info!("Clausia is running. Press Ctrl+C to stop.");
    runtime
        .run(shutdown_signal())
        .await
        .context("runtime stopped with an error")?;

    Ok(())
}
