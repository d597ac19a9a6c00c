//! Environment-driven configuration for the upload service.
//!
//! Every value has a default, so the server starts with no environment set.
//! The resulting [`AppConfig`] is handed to [`crate::build_app`] explicitly.

use crate::processing::HeartRateZones;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

pub const ADDR_ENV: &str = "RUSTYTCX_ADDR";
pub const MAX_UPLOAD_BYTES_ENV: &str = "RUSTYTCX_MAX_UPLOAD_BYTES";
pub const MAX_HR_ENV: &str = "RUSTYTCX_MAX_HR";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_HR: f64 = 185.0;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    /// Request body limit applied to upload routes.
    pub max_upload_bytes: usize,
    pub zones: HeartRateZones,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            zones: HeartRateZones::from_max_hr(DEFAULT_MAX_HR),
        }
    }
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup, so tests don't
    /// have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let addr = parse_or(&lookup, ADDR_ENV, defaults.addr)?;
        let max_upload_bytes = parse_or(&lookup, MAX_UPLOAD_BYTES_ENV, defaults.max_upload_bytes)?;
        let max_hr = parse_or(&lookup, MAX_HR_ENV, defaults.zones.max_hr)?;

        if max_upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: MAX_UPLOAD_BYTES_ENV,
                value: "0".into(),
            });
        }
        if !max_hr.is_finite() || max_hr <= 0.0 {
            return Err(ConfigError::Invalid {
                key: MAX_HR_ENV,
                value: max_hr.to_string(),
            });
        }

        Ok(Self {
            addr,
            max_upload_bytes,
            zones: HeartRateZones::from_max_hr(max_hr),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            key,
            value: raw.clone(),
        }),
        None => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value } => {
                write!(f, "Invalid value for {key}: {value:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
