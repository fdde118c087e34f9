// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub fn fieldsync() -> Command {
    cargo_bin_cmd!("fieldsync")
}

/// Write `content` to `fieldsync.toml` in a fresh temp directory.
pub fn config_file(content: &str) -> (TempDir, std::path::PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("fieldsync.toml");
    std::fs::write(&path, content).unwrap();
    (temp, path)
}

/// A local port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
