// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fieldsync_core::Topic;

#[derive(Parser, Debug)]
#[command(name = "fieldsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Diagnostics for the fieldsync real-time and offline sync layer")]
pub struct Cli {
    /// TOML configuration file ([realtime], [cache] and [sync] tables)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a live endpoint and print every event as a JSON line
    Listen {
        /// ws:// or wss:// URL, or an http(s):// event stream with --stream
        url: String,

        /// Use a server-sent event stream instead of a WebSocket
        #[arg(long)]
        stream: bool,

        /// Only print events of this kind (connect, disconnect, message,
        /// error, reconnect, or * for all)
        #[arg(long, default_value = Topic::WILDCARD)]
        topic: Topic,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
