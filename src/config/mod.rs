//! Cache configuration.
//!
//! The only tunable is the entry time-to-live. It can be set in code, read
//! from the `HRSTORE_CACHE_TTL_MS` environment variable, or deserialized as
//! part of a larger application config:
//!
//! ```
//! use std::time::Duration;
//! use hrstore::config::CacheConfig;
//!
//! let config: CacheConfig = serde_json::from_str(r#"{ "ttl_ms": 30000 }"#).unwrap();
//! assert_eq!(config.ttl(), Duration::from_secs(30));
//! ```

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Default entry lifetime: one minute.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Environment variable holding the TTL in milliseconds.
pub const TTL_ENV_VAR: &str = "HRSTORE_CACHE_TTL_MS";

/// Errors produced while loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Settings for a [`ScopedReadCache`](crate::cache::ScopedReadCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    #[serde(rename = "ttl_ms", deserialize_with = "ttl_from_millis")]
    ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL }
    }
}

impl CacheConfig {
    /// Creates a config with the default TTL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Loads the config from the process environment.
    ///
    /// Falls back to [`DEFAULT_TTL`] when [`TTL_ENV_VAR`] is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the variable is set but is not a
    /// positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads the config through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(TTL_ENV_VAR) {
            Some(raw) => Ok(Self::default().with_ttl(parse_ttl_millis(&raw)?)),
            None => Ok(Self::default()),
        }
    }
}

fn parse_ttl_millis(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason| ConfigError::Invalid {
        var: TTL_ENV_VAR,
        value: raw.to_owned(),
        reason,
    };

    let millis: u64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("expected milliseconds as an integer"))?;
    if millis == 0 {
        return Err(invalid("ttl must be greater than zero"));
    }
    Ok(Duration::from_millis(millis))
}

fn ttl_from_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = u64::deserialize(deserializer)?;
    if millis == 0 {
        return Err(serde::de::Error::custom("ttl_ms must be greater than zero"));
    }
    Ok(Duration::from_millis(millis))
}
