// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use fieldsync_core::Config;

use crate::error::Result;

/// Render the effective configuration, defaults included.
pub fn render(config: &Config) -> Result<String> {
    Ok(config.to_toml_string()?)
}

pub fn run(config: &Config) -> Result<()> {
    print!("{}", render(config)?);
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
