// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection events fanned out to subscribers.
//!
//! An [`Event`] is an immutable record of something the connection observed:
//! a lifecycle change, an inbound message, an error, or a reconnect attempt.
//! Listeners subscribe by [`Topic`], which is either a single [`EventKind`]
//! or the wildcard that matches every kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The kind of a connection event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The transport opened.
    Connect,
    /// The transport closed, unexpectedly or by request.
    Disconnect,
    /// An inbound message arrived.
    Message,
    /// A transport error, or the terminal reconnect-exhausted error.
    Error,
    /// A reconnect attempt is about to start.
    Reconnect,
}

impl EventKind {
    /// Returns the string representation used in logs and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connect => "connect",
            EventKind::Disconnect => "disconnect",
            EventKind::Message => "message",
            EventKind::Error => "error",
            EventKind::Reconnect => "reconnect",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "connect" => Ok(EventKind::Connect),
            "disconnect" => Ok(EventKind::Disconnect),
            "message" => Ok(EventKind::Message),
            "error" => Ok(EventKind::Error),
            "reconnect" => Ok(EventKind::Reconnect),
            _ => Err(Error::InvalidEventKind(s.to_string())),
        }
    }
}

/// What a listener subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Events of one kind only.
    Kind(EventKind),
    /// Every event regardless of kind.
    Any,
}

impl Topic {
    /// Wildcard spelling accepted by [`FromStr`].
    pub const WILDCARD: &'static str = "*";
}

impl From<EventKind> for Topic {
    fn from(kind: EventKind) -> Self {
        Topic::Kind(kind)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Kind(kind) => write!(f, "{}", kind),
            Topic::Any => write!(f, "{}", Self::WILDCARD),
        }
    }
}

impl FromStr for Topic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == Self::WILDCARD {
            return Ok(Topic::Any);
        }
        s.parse().map(Topic::Kind)
    }
}

/// Data carried by an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Payload {
    /// Inbound message that parsed as JSON.
    Json(serde_json::Value),
    /// Inbound message that did not parse as JSON, passed through untouched.
    Raw(String),
    /// Human-readable description (errors, close reasons).
    Text(String),
    /// Reconnect attempt number, starting at 1.
    Attempt(u32),
    /// Reconnection gave up after this many attempts.
    Exhausted {
        /// Number of reconnect attempts made before giving up.
        attempts: u32,
    },
}

impl Payload {
    /// Wraps inbound text: JSON when it parses, the raw string otherwise.
    pub fn from_inbound(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Raw(text.to_string()),
        }
    }

    /// Returns the JSON value, if this payload is structured.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// An immutable record of something the connection observed or emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// Optional data for the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Creates an event stamped with the current time.
    pub fn new(kind: EventKind, payload: Option<Payload>) -> Self {
        Event {
            kind,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// The transport opened.
    pub fn connect() -> Self {
        Self::new(EventKind::Connect, None)
    }

    /// The transport closed.
    pub fn disconnect(reason: Option<String>) -> Self {
        Self::new(EventKind::Disconnect, reason.map(Payload::Text))
    }

    /// An inbound message arrived.
    pub fn message(payload: Payload) -> Self {
        Self::new(EventKind::Message, Some(payload))
    }

    /// A transport error occurred.
    pub fn error(description: impl Into<String>) -> Self {
        Self::new(EventKind::Error, Some(Payload::Text(description.into())))
    }

    /// Reconnection gave up. Terminal until a manual connect.
    pub fn reconnect_exhausted(attempts: u32) -> Self {
        Self::new(EventKind::Error, Some(Payload::Exhausted { attempts }))
    }

    /// A reconnect attempt is about to start.
    pub fn reconnect(attempt: u32) -> Self {
        Self::new(EventKind::Reconnect, Some(Payload::Attempt(attempt)))
    }

    /// Returns true for the terminal reconnect-exhausted error.
    pub fn is_reconnect_exhausted(&self) -> bool {
        matches!(self.payload, Some(Payload::Exhausted { .. }))
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
