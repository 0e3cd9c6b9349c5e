//! Configuration management module
//!
//! Defaults, then an optional JSON config file, then `SEATLENS_*`
//! environment overrides.

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SITE_HOST: &str = "https://in.bookmyshow.com";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatlensConfig {
    /// Base address of the ticketing site.
    pub site_host: String,
    /// Absolute budget for one probe, in milliseconds.
    pub probe_timeout_ms: u64,
    /// Freshness window of cached seat stats, in milliseconds.
    pub cache_ttl_ms: u64,
    /// Cadence of the render-trigger poller, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for SeatlensConfig {
    fn default() -> Self {
        Self {
            site_host: DEFAULT_SITE_HOST.to_string(),
            probe_timeout_ms: 20_000,
            cache_ttl_ms: 5 * 60 * 1000,
            poll_interval_ms: 200,
        }
    }
}

impl SeatlensConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Load configuration from an optional file, then apply environment
/// overrides.
pub fn load_configuration(config_file: Option<&Path>) -> Result<SeatlensConfig> {
    let mut config = match config_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => SeatlensConfig::default(),
    };

    if let Ok(host) = env::var("SEATLENS_SITE_HOST") {
        let trimmed = host.trim();
        if !trimmed.is_empty() {
            config.site_host = trimmed.to_string();
        }
    }
    if let Some(value) = env_millis("SEATLENS_PROBE_TIMEOUT_MS") {
        config.probe_timeout_ms = value;
    }
    if let Some(value) = env_millis("SEATLENS_CACHE_TTL_MS") {
        config.cache_ttl_ms = value;
    }
    if let Some(value) = env_millis("SEATLENS_POLL_INTERVAL_MS") {
        config.poll_interval_ms = value;
    }

    Ok(config)
}

fn env_millis(name: &str) -> Option<u64> {
    env::var(name).ok()?.trim().parse().ok()
}
