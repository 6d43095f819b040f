//! Sweep interval configuration
//!
//! `CHECK_INTERVAL_UNIT` picks one of `second`, `minute`, `hour` or `day`.
//! Unset or unrecognized values fall back to `minute`.
//! `CLAUSIA_SWEEP_INTERVAL_SECS` overrides the unit with an exact period.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub const UNIT_ENV: &str = "CHECK_INTERVAL_UNIT";
pub const SECS_ENV: &str = "CLAUSIA_SWEEP_INTERVAL_SECS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Second,
    #[default]
    Minute,
    Hour,
    Day,
}

impl IntervalUnit {
    /// Unknown names map to `Minute`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "second" => Self::Second,
            "minute" | "" => Self::Minute,
            "hour" => Self::Hour,
            "day" => Self::Day,
            other => {
                warn!(unit = other, "Unknown sweep interval unit, using minute");
                Self::Minute
            }
        }
    }

    pub fn period(self) -> Duration {
        match self {
            Self::Second => Duration::from_secs(1),
            Self::Minute => Duration::from_secs(60),
            Self::Hour => Duration::from_secs(60 * 60),
            Self::Day => Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self::from_unit(IntervalUnit::default())
    }
}

impl SweepConfig {
    pub fn from_unit(unit: IntervalUnit) -> Self {
        Self {
            interval: unit.period(),
        }
    }

    pub fn every(interval: Duration) -> Self {
        Self { interval }
    }

    /// Build from raw variable values.
    pub fn from_vars(unit: Option<&str>, secs: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(raw) = secs {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidInterval(raw.to_string()))?;
            if secs == 0 {
                return Err(ConfigError::InvalidInterval(raw.to_string()));
            }
            return Ok(Self::every(Duration::from_secs(secs)));
        }
        Ok(Self::from_unit(
            unit.map(IntervalUnit::parse).unwrap_or_default(),
        ))
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let unit = std::env::var(UNIT_ENV).ok();
        let secs = std::env::var(SECS_ENV).ok();
        Self::from_vars(unit.as_deref(), secs.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(IntervalUnit::parse("second").period(), Duration::from_secs(1));
        assert_eq!(IntervalUnit::parse("hour").period(), Duration::from_secs(3600));
        assert_eq!(IntervalUnit::parse("Day").period(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_unknown_unit_falls_back_to_minute() {
        assert_eq!(IntervalUnit::parse("fortnight"), IntervalUnit::Minute);
        assert_eq!(SweepConfig::from_vars(None, None).unwrap().interval, Duration::from_secs(60));
        assert_eq!(
            SweepConfig::from_vars(Some(""), None).unwrap().interval,
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_seconds_override_unit() {
        let config = SweepConfig::from_vars(Some("day"), Some("5")).unwrap();
        assert_eq!(config.interval, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_seconds() {
        assert!(matches!(
            SweepConfig::from_vars(None, Some("0")),
            Err(ConfigError::InvalidInterval(_))
        ));
        assert!(matches!(
            SweepConfig::from_vars(None, Some("soon")),
            Err(ConfigError::InvalidInterval(_))
        ));
    }
}
