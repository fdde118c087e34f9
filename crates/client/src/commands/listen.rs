// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `fieldsync listen`: stream connection events to stdout.

use std::sync::Arc;

use fieldsync_core::{Event, EventKind, RealtimeConfig, Topic};
use tokio::sync::Notify;

use crate::error::{Error, Result};
use crate::realtime::ConnectionManager;

/// Connect to `url` and print matching events until Ctrl-C or until
/// reconnection gives up.
pub async fn run(url: String, stream: bool, topic: Topic, config: RealtimeConfig) -> Result<()> {
    let auto_reconnect = config.auto_reconnect;
    let max_attempts = config.max_reconnect_attempts;
    let manager = if stream {
        ConnectionManager::event_stream(url, config)
    } else {
        ConnectionManager::websocket(url, config)
    };

    let exhausted = Arc::new(Notify::new());
    let _printer = manager.on(topic, |event| print_event(event));
    let signal = Arc::clone(&exhausted);
    let _watch = manager.on(EventKind::Error, move |event| {
        if event.is_reconnect_exhausted() {
            signal.notify_one();
        }
    });

    if let Err(e) = manager.connect().await {
        if !auto_reconnect {
            return Err(e.into());
        }
        tracing::info!(error = %e, "initial connect failed, retrying in background");
    }

    let outcome = tokio::select! {
        result = tokio::signal::ctrl_c() => result.map_err(Error::from),
        _ = exhausted.notified() => Err(Error::ReconnectExhausted(max_attempts)),
    };
    manager.disconnect();
    outcome
}

/// One event per line, as JSON.
pub(crate) fn format_event(event: &Event) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(line) => Some(line),
        Err(e) => {
            tracing::warn!(error = %e, "failed to encode event");
            None
        }
    }
}

fn print_event(event: &Event) {
    if let Some(line) = format_event(event) {
        println!("{line}");
    }
}

#[cfg(test)]
#[path = "listen_tests.rs"]
mod tests;
