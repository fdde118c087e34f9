// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration for the coherence layer.
//!
//! Configuration is read from a TOML file with three optional tables:
//! - `[realtime]`: reconnect policy, heartbeat, message timeout
//! - `[cache]`: sweep interval
//! - `[sync]`: automatic flush triggers and debounce delay
//!
//! Every field is optional and falls back to its documented default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Connection manager policy.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Cache store settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Sync queue settings.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    /// Loads and validates configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects values the runtime cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.cache.sweep_interval_ms == 0 {
            return Err(Error::InvalidConfigValue {
                field: "cache.sweep_interval_ms",
                reason: "must be greater than 0".to_string(),
                hint: "omit the field to use the default of 60000",
            });
        }
        Ok(())
    }
}

/// Policy for one logical real-time connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Reconnect after an unexpected close (default: true).
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,
    /// Reconnect attempts before giving up with a terminal error (default: 5).
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Base reconnect delay in milliseconds; attempt n waits n times this (default: 1000).
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Heartbeat ping interval in milliseconds (default: 30000). 0 = disabled.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Per-message acknowledgement timeout in milliseconds (default: 5000).
    /// Reserved: kept in the policy, not yet enforced.
    #[serde(default = "default_message_timeout_ms")]
    pub message_timeout_ms: u64,
}

fn default_auto_reconnect() -> bool {
    true
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_message_timeout_ms() -> u64 {
    5000
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        RealtimeConfig {
            auto_reconnect: default_auto_reconnect(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            message_timeout_ms: default_message_timeout_ms(),
        }
    }
}

impl RealtimeConfig {
    /// Delay before the given reconnect attempt (linear backoff).
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms.saturating_mul(u64::from(attempt)))
    }

    /// Heartbeat interval, or `None` when disabled.
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        match self.heartbeat_interval_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Per-message acknowledgement timeout.
    pub fn message_timeout(&self) -> Duration {
        Duration::from_millis(self.message_timeout_ms)
    }
}

/// Cache store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How often expired entries are purged, in milliseconds (default: 60000).
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

fn default_sweep_interval_ms() -> u64 {
    60_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl CacheConfig {
    /// Sweep interval as a duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

/// Sync queue settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Flush immediately when the host regains focus (default: false).
    #[serde(default)]
    pub sync_on_focus: bool,
    /// Flush immediately when connectivity is restored (default: false).
    #[serde(default)]
    pub sync_on_online: bool,
    /// Quiet period after the last queued item before an automatic flush,
    /// in milliseconds (default: 1000).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    1000
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            sync_on_focus: false,
            sync_on_online: false,
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SyncConfig {
    /// Debounce delay as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
