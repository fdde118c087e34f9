// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Control frames the client writes on a bidirectional connection.
//!
//! Application payloads are opaque JSON values. The only frame the coherence
//! layer originates on its own is the heartbeat ping, serialized as
//! `{"type":"ping"}`. A server is expected to ignore it or answer with an
//! application-level message, which listeners receive like any other.

use serde::{Deserialize, Serialize};

/// Frames originated by the client itself rather than by the application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Keepalive sent every heartbeat interval.
    Ping,
}

impl ClientFrame {
    /// Creates a Ping frame.
    pub fn ping() -> Self {
        ClientFrame::Ping
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the frame from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
