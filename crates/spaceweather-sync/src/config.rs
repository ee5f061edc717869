// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sync configuration.
//!
//! Supports both programmatic (builder) and TOML file configuration.
//!
//! ```toml
//! bootstrap_lookback_minutes = 180
//!
//! [sink]
//! url = "https://influx.example.com/api/v1/push/influx/write"
//! username = "12345"
//! api_key = "glc_..."
//!
//! [feeds]
//! kp = "https://services.swpc.noaa.gov/json/planetary_k_index_1m.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default planetary K index feed.
pub const DEFAULT_KP_URL: &str = "https://services.swpc.noaa.gov/json/planetary_k_index_1m.json";
/// Default real-time solar wind plasma feed.
pub const DEFAULT_WIND_URL: &str = "https://services.swpc.noaa.gov/json/rtsw/rtsw_wind_1m.json";
/// Default real-time solar wind magnetic field feed.
pub const DEFAULT_MAG_URL: &str = "https://services.swpc.noaa.gov/json/rtsw/rtsw_mag_1m.json";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing configuration: {0}")]
    Missing(&'static str),
}

/// Top-level sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Metrics sink connection.
    #[serde(default)]
    pub sink: SinkConfig,

    /// Upstream feed URLs.
    #[serde(default)]
    pub feeds: FeedConfig,

    /// Cold-start lookback in minutes (0 = take whatever the feeds return).
    #[serde(default)]
    pub bootstrap_lookback_minutes: i64,
}

/// Line Protocol sink endpoint and basic-auth credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Write endpoint URL.
    pub url: Option<String>,
    /// Basic-auth user.
    pub username: Option<String>,
    /// Basic-auth password (API key).
    pub api_key: Option<String>,
}

impl SinkConfig {
    /// URL, username and API key; errors on the first missing one.
    pub fn credentials(&self) -> Result<(&str, &str, &str), ConfigError> {
        let url = present(&self.url).ok_or(ConfigError::Missing("sink url"))?;
        let user = present(&self.username).ok_or(ConfigError::Missing("sink username"))?;
        let key = present(&self.api_key).ok_or(ConfigError::Missing("sink api key"))?;
        Ok((url, user, key))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Feed URLs, one per series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_kp_url")]
    pub kp: String,
    #[serde(default = "default_wind_url")]
    pub wind: String,
    #[serde(default = "default_mag_url")]
    pub mag: String,
}

fn default_kp_url() -> String {
    DEFAULT_KP_URL.to_string()
}

fn default_wind_url() -> String {
    DEFAULT_WIND_URL.to_string()
}

fn default_mag_url() -> String {
    DEFAULT_MAG_URL.to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            kp: default_kp_url(),
            wind: default_wind_url(),
            mag: default_mag_url(),
        }
    }
}

impl SyncConfig {
    /// Create a new config builder
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Validate the configuration.
    ///
    /// Sink credentials are not checked here; the pusher checks them when
    /// it has a batch to send.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            ("kp", &self.feeds.kp),
            ("wind", &self.feeds.wind),
            ("mag", &self.feeds.mag),
        ] {
            if url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("feed URL for {} is empty", name)));
            }
        }
        if self.bootstrap_lookback_minutes < 0 {
            return Err(ConfigError::Invalid(format!(
                "bootstrap_lookback_minutes must not be negative ({})",
                self.bootstrap_lookback_minutes
            )));
        }
        Ok(())
    }

    /// Lookback in milliseconds when bootstrapping is enabled.
    pub fn bootstrap_lookback_ms(&self) -> Option<i64> {
        (self.bootstrap_lookback_minutes > 0)
            .then(|| self.bootstrap_lookback_minutes.saturating_mul(60_000))
    }
}

/// Config builder for fluent API
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    /// Set the sink endpoint and credentials
    pub fn sink(
        mut self,
        url: impl Into<String>,
        username: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        self.config.sink = SinkConfig {
            url: Some(url.into()),
            username: Some(username.into()),
            api_key: Some(api_key.into()),
        };
        self
    }

    /// Set the K index feed URL
    pub fn kp_url(mut self, url: impl Into<String>) -> Self {
        self.config.feeds.kp = url.into();
        self
    }

    /// Set the solar wind plasma feed URL
    pub fn wind_url(mut self, url: impl Into<String>) -> Self {
        self.config.feeds.wind = url.into();
        self
    }

    /// Set the magnetic field feed URL
    pub fn mag_url(mut self, url: impl Into<String>) -> Self {
        self.config.feeds.mag = url.into();
        self
    }

    /// Set the cold-start lookback in minutes (0 disables)
    pub fn bootstrap_lookback_minutes(mut self, minutes: i64) -> Self {
        self.config.bootstrap_lookback_minutes = minutes;
        self
    }

    /// Build the configuration
    pub fn build(self) -> SyncConfig {
        self.config
    }
}
