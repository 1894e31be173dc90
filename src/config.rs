// src/config.rs
// =============================================================================
// Checker settings.
//
// Defaults are deliberately small: a bookmark collection often points at many
// pages on the same few hosts, and we don't want to hammer them.
//
// Settings can come from three places, lowest priority first:
// 1. CheckerConfig::default()
// 2. A TOML file passed with --config (every key optional)
// 3. Individual CLI flags
// =============================================================================

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 6;
pub const DEFAULT_MAX_REDIRECTS: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    /// How many probes may be in flight at once
    pub concurrency: usize,
    /// Upper bound for one whole probe, redirects included
    #[serde(rename = "timeout_secs", deserialize_with = "duration_from_secs")]
    pub per_request_timeout: Duration,
    #[serde(rename = "connect_timeout_secs", deserialize_with = "duration_from_secs")]
    pub connect_timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            per_request_timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: concat!("favcheck/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl CheckerConfig {
    /// Reads a TOML config file. Missing keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: CheckerConfig = toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.per_request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

// Durations are written as (possibly fractional) seconds: `timeout_secs = 2.5`
fn duration_from_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}
