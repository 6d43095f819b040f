//! # Clausia Telemetry
//!
//! Logging setup shared by the Clausia binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clausia_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // Application code here
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CLAUSIA_SERVICE_NAME` | `clausia` | Service name in the startup line |
//! | `CLAUSIA_LOG_LEVEL` | `info` | Log filter, falls back to `RUST_LOG` |
//! | `CLAUSIA_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `CLAUSIA_JSON_LOGS` | `false` | JSON lines (on by default in containers) |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and announce the service.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)?;
    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );
    Ok(())
}
