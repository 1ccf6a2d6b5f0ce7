//! Process settings read from `RIDEBOOK_*` environment variables.
//!
//! The booking policy set here is the fallback for organizations that load
//! without one of their own.

use std::fmt;
use std::str::FromStr;

use crate::model::BookingPolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub default_policy: BookingPolicy,
    pub metrics_port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { var: &'static str, value: String },
    Policy(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { var, value } => write!(f, "invalid value for {var}: {value:?}"),
            ConfigError::Policy(msg) => write!(f, "invalid default policy: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build settings from any variable source. Unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut settings = Settings::default();
        let p = &mut settings.default_policy;

        read(&lookup, "RIDEBOOK_SLOT_MINUTES", &mut p.slot_duration_minutes)?;
        read(&lookup, "RIDEBOOK_BUFFER_BEFORE_MINUTES", &mut p.buffer_before_minutes)?;
        read(&lookup, "RIDEBOOK_BUFFER_AFTER_MINUTES", &mut p.buffer_after_minutes)?;
        read(&lookup, "RIDEBOOK_MIN_NOTICE_HOURS", &mut p.minimum_notice_hours)?;
        read(&lookup, "RIDEBOOK_MAX_ADVANCE_DAYS", &mut p.max_advance_booking_days)?;
        read(&lookup, "RIDEBOOK_VEHICLES", &mut p.vehicle_capacity)?;
        p.validate().map_err(ConfigError::Policy)?;

        if let Some(raw) = lookup("RIDEBOOK_METRICS_PORT") {
            let port = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "RIDEBOOK_METRICS_PORT",
                value: raw.clone(),
            })?;
            settings.metrics_port = Some(port);
        }
        Ok(settings)
    }
}

fn read<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(raw) = lookup(var) {
        *target = raw.trim().parse().map_err(|_| ConfigError::Invalid { var, value: raw.clone() })?;
    }
    Ok(())
}
