//! # Runtime Configuration
//!
//! Defaults with environment overrides. Unparsable numeric overrides are
//! ignored with a warning; `validate()` rejects values the wiring cannot use.

use cl_02_notification_hub::{HubConfig, DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_CONNECTIONS_PER_USER};
use cl_03_sweep_driver::{config as sweep_env, SweepConfig};
use serde::{Deserialize, Serialize};
use shared_types::SignerKey;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_WS_BIND: &str = "0.0.0.0:8546";

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Invalid signer entry '{0}', expected email=signer_key")]
    InvalidSigner(String),

    #[error(transparent)]
    Sweep(#[from] cl_03_sweep_driver::ConfigError),
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// WebSocket listen address.
    pub ws_bind: SocketAddr,
    /// Per-connection outbound buffer.
    pub buffer_capacity: usize,
    /// Concurrent connections allowed for one user.
    pub max_connections_per_user: usize,
    pub sweep: SweepConfig,
    /// Directory seed, email to signer key.
    pub signers: BTreeMap<String, SignerKey>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ws_bind: SocketAddr::from(([0, 0, 0, 0], 8546)),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_connections_per_user: DEFAULT_MAX_CONNECTIONS_PER_USER,
            sweep: SweepConfig::default(),
            signers: BTreeMap::new(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `CLAUSIA_WS_BIND`: listen address (default: 0.0.0.0:8546)
    /// - `CLAUSIA_WS_BUFFER`: per-connection buffer (default: 256)
    /// - `CLAUSIA_MAX_CONNECTIONS_PER_USER`: default 16
    /// - `CHECK_INTERVAL_UNIT`, `CLAUSIA_SWEEP_INTERVAL_SECS`: sweep period
    /// - `CLAUSIA_SIGNERS`: `email=key` pairs separated by commas
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(bind) = lookup("CLAUSIA_WS_BIND") {
            match bind.parse() {
                Ok(addr) => config.ws_bind = addr,
                Err(_) => warn!(value = %bind, "CLAUSIA_WS_BIND is not a socket address, using default"),
            }
        }
        if let Some(buffer) = lookup("CLAUSIA_WS_BUFFER") {
            match buffer.parse() {
                Ok(n) => config.buffer_capacity = n,
                Err(_) => warn!(value = %buffer, "CLAUSIA_WS_BUFFER is not a number, using default"),
            }
        }
        if let Some(max) = lookup("CLAUSIA_MAX_CONNECTIONS_PER_USER") {
            match max.parse() {
                Ok(n) => config.max_connections_per_user = n,
                Err(_) => warn!(value = %max, "CLAUSIA_MAX_CONNECTIONS_PER_USER is not a number, using default"),
            }
        }

        let unit = lookup(sweep_env::UNIT_ENV);
        let secs = lookup(sweep_env::SECS_ENV);
        config.sweep = SweepConfig::from_vars(unit.as_deref(), secs.as_deref())?;

        if let Some(signers) = lookup("CLAUSIA_SIGNERS") {
            config.signers = parse_signers(&signers)?;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                name: "buffer_capacity",
                value: "0".into(),
            });
        }
        if self.max_connections_per_user == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_connections_per_user",
                value: "0".into(),
            });
        }
        if self.sweep.interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "sweep.interval",
                value: "0s".into(),
            });
        }
        Ok(())
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            buffer_capacity: self.buffer_capacity,
            max_connections_per_user: self.max_connections_per_user,
        }
    }
}

fn parse_signers(raw: &str) -> Result<BTreeMap<String, SignerKey>, ConfigError> {
    let mut signers = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (email, key) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidSigner(entry.to_string()))?;
        let (email, key) = (email.trim(), key.trim());
        if email.is_empty() || key.is_empty() {
            return Err(ConfigError::InvalidSigner(entry.to_string()));
        }
        signers.insert(email.to_string(), SignerKey::new(key));
    }
    Ok(signers)
}
