// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fieldsync - client-side real-time and offline data coherence.
//!
//! This crate keeps a client's view of remote data fresh while tolerating
//! flaky connectivity.
//!
//! # Main Components
//!
//! - [`ConnectionManager`] - one reconnecting WebSocket or event-stream
//!   connection with heartbeat and topic-based event fan-out
//! - [`CacheStore`] - TTL cache with background sweep, plus the
//!   read-through [`CachedQuery`]
//! - [`SyncQueue`] - debounced, ordered write-behind with whole-batch requeue
//! - [`Optimistic`] - local-first updates with rollback on rejection
//! - [`ChannelHub`] - named in-process broadcast channels
//!
//! # Example
//!
//! ```rust,ignore
//! use fieldsync::{Config, ConnectionManager, EventKind, SyncQueue};
//!
//! let config = Config::load(Path::new("fieldsync.toml"))?;
//! let live = ConnectionManager::websocket("wss://farm.example/live", config.realtime);
//! let _sub = live.on(EventKind::Message, |event| println!("{:?}", event.payload));
//! live.connect().await?;
//!
//! let queue = SyncQueue::new(|record| push_to_server(record), config.sync);
//! queue.queue("livestock:12", record);
//! ```

mod cli;
mod commands;

pub mod cache;
pub mod error;
pub mod listeners;
pub mod optimistic;
pub mod realtime;
pub mod sync;

pub use cache::{CacheStore, CachedQuery, QueryState};
pub use cli::{Cli, Command};
pub use error::{BoxError, Error, Result, SharedError};
pub use fieldsync_core::{
    CacheConfig, ClientFrame, Config, Event, EventKind, Payload, RealtimeConfig, SyncConfig,
    Topic,
};
pub use listeners::Subscription;
pub use optimistic::{Optimistic, OptimisticState};
pub use realtime::{
    BroadcastChannel, ChannelHub, ConnectionManager, ConnectionState, EventBus, RealtimeError,
};
pub use sync::{HostSignal, HostSignals, SyncError, SyncItem, SyncQueue};

/// Execute a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Config => commands::config::run(&config),
        Command::Listen { url, stream, topic } => {
            commands::listen::run(url, stream, topic, config.realtime).await
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
