// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway settings.
//!
//! A TOML file holds the sync settings at the top level plus a `[gateway]`
//! table; command-line flags and environment variables override it.

use serde::{Deserialize, Serialize};
use spaceweather_sync::{ConfigError, SyncConfig};
use std::path::{Path, PathBuf};

/// Default SQLite state file.
pub const DEFAULT_STATE_DB: &str = "spaceweather-state.db";
/// Default timer period in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;
/// Default bind address.
pub const DEFAULT_BIND: &str = "0.0.0.0";
/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// On-disk configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(flatten)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// `[gateway]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Shared secret for the manual trigger. Unset disables it.
    pub trigger_token: Option<String>,
    pub state_db: Option<PathBuf>,
    /// Timer period; 0 disables the timer.
    pub interval_secs: Option<u64>,
    pub bind: Option<String>,
    pub port: Option<u16>,
}

impl FileConfig {
    /// Load from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig = toml::from_str(content)?;
        config.sync.validate()?;
        Ok(config)
    }
}

/// Explicit overrides from flags or the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub sink_url: Option<String>,
    pub sink_username: Option<String>,
    pub sink_api_key: Option<String>,
    pub kp_url: Option<String>,
    pub wind_url: Option<String>,
    pub mag_url: Option<String>,
    pub bootstrap_lookback_minutes: Option<i64>,
    pub trigger_token: Option<String>,
    pub state_db: Option<PathBuf>,
    pub interval_secs: Option<u64>,
    pub bind: Option<String>,
    pub port: Option<u16>,
}

/// Resolved gateway settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub sync: SyncConfig,
    pub trigger_token: Option<String>,
    pub state_db: PathBuf,
    pub interval_secs: u64,
    pub bind: String,
    pub port: u16,
}

impl Settings {
    /// Apply `overrides` on top of `file`, then fill defaults.
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self, ConfigError> {
        let FileConfig { mut sync, gateway } = file;

        if overrides.sink_url.is_some() {
            sync.sink.url = overrides.sink_url;
        }
        if overrides.sink_username.is_some() {
            sync.sink.username = overrides.sink_username;
        }
        if overrides.sink_api_key.is_some() {
            sync.sink.api_key = overrides.sink_api_key;
        }
        if let Some(url) = overrides.kp_url {
            sync.feeds.kp = url;
        }
        if let Some(url) = overrides.wind_url {
            sync.feeds.wind = url;
        }
        if let Some(url) = overrides.mag_url {
            sync.feeds.mag = url;
        }
        if let Some(minutes) = overrides.bootstrap_lookback_minutes {
            sync.bootstrap_lookback_minutes = minutes;
        }
        sync.validate()?;

        let trigger_token = overrides
            .trigger_token
            .or(gateway.trigger_token)
            .filter(|t| !t.trim().is_empty());

        Ok(Self {
            sync,
            trigger_token,
            state_db: overrides
                .state_db
                .or(gateway.state_db)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DB)),
            interval_secs: overrides
                .interval_secs
                .or(gateway.interval_secs)
                .unwrap_or(DEFAULT_INTERVAL_SECS),
            bind: overrides
                .bind
                .or(gateway.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: overrides.port.or(gateway.port).unwrap_or(DEFAULT_PORT),
        })
    }

    /// `bind:port`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
