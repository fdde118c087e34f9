// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Real-time connection handling.
//!
//! A [`ConnectionManager`] owns one logical connection to a remote endpoint,
//! either a bidirectional WebSocket or a receive-only event stream, and fans
//! its events out through an [`EventBus`]. A [`ChannelHub`] lets sibling
//! contexts within the process exchange messages without a server.

mod bus;
mod channel;
mod manager;
mod transport;

pub use bus::EventBus;
pub use channel::{BroadcastChannel, ChannelHub};
pub use manager::{ConnectionManager, ConnectionState, RealtimeError};
pub use transport::{
    EventStreamTransport, Transport, TransportError, TransportFactory, TransportKind,
    TransportResult, WebSocketTransport,
};

#[cfg(test)]
#[path = "transport_tests.rs"]
pub(crate) mod mock;
