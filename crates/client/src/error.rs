// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use thiserror::Error;

use crate::realtime::{RealtimeError, TransportError};
use crate::sync::SyncError;

/// Error type accepted from caller-supplied fetch, sync and update functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A recorded error that can be cloned into state snapshots.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// All errors surfaced by the fieldsync library and CLI.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] fieldsync_core::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("realtime error: {0}")]
    Realtime(#[from] RealtimeError),

    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("reconnect attempts exhausted after {0} tries\n  hint: check the URL and raise realtime.max_reconnect_attempts if the server is slow to start")]
    ReconnectExhausted(u32),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
