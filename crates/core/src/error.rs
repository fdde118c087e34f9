// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for fieldsync-core operations.

use thiserror::Error;

/// All possible errors that can occur in fieldsync-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid event kind: '{0}'\n  hint: valid kinds are: connect, disconnect, message, error, reconnect, *")]
    InvalidEventKind(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid config value for {field}: {reason}\n  hint: {hint}")]
    InvalidConfigValue {
        field: &'static str,
        reason: String,
        hint: &'static str,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("toml write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

/// A specialized Result type for fieldsync-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
