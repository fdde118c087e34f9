// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Named in-process broadcast channels.
//!
//! Members that join the same name on one [`ChannelHub`] see each other's
//! posts but never their own. Delivery is best effort: a member that falls
//! too far behind skips the oldest messages and logs a warning.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

/// Messages buffered per channel before slow members start lagging.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct Envelope {
    sender: u64,
    body: Value,
}

/// Owner of a set of named channels.
///
/// Hubs are explicit instances; two hubs never share channels even when the
/// names match.
#[derive(Clone, Default)]
pub struct ChannelHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<Envelope>>>>,
    next_member: Arc<AtomicU64>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the channel called `name`, creating it on first use.
    pub fn join(&self, name: impl Into<String>) -> BroadcastChannel {
        let name = name.into();
        let tx = {
            let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
            channels
                .entry(name.clone())
                .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
                .clone()
        };
        let rx = tx.subscribe();
        BroadcastChannel {
            name,
            member: self.next_member.fetch_add(1, Ordering::Relaxed),
            tx,
            rx,
        }
    }
}

/// One member of a named channel.
pub struct BroadcastChannel {
    name: String,
    member: u64,
    tx: broadcast::Sender<Envelope>,
    rx: broadcast::Receiver<Envelope>,
}

impl BroadcastChannel {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Post a message to every other member.
    ///
    /// Returns how many other members will receive it. Serialization failures
    /// and posts with no listeners are logged and dropped.
    pub fn post<T: Serialize + ?Sized>(&self, message: &T) -> usize {
        let body = match serde_json::to_value(message) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(channel = %self.name, error = %e, "dropping unserializable post");
                return 0;
            }
        };
        let envelope = Envelope {
            sender: self.member,
            body,
        };
        match self.tx.send(envelope) {
            Ok(receivers) => receivers.saturating_sub(1),
            Err(_) => 0,
        }
    }

    /// Wait for the next message posted by another member.
    ///
    /// Returns `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Value> {
        loop {
            match self.rx.recv().await {
                Ok(envelope) if envelope.sender == self.member => continue,
                Ok(envelope) => return Some(envelope.body),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(channel = %self.name, skipped, "channel member lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
