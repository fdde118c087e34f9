// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fieldsync-core: Shared types for the fieldsync coherence layer
//!
//! This crate provides the runtime-independent pieces used by the fieldsync
//! client: connection events, wire frames, the server-sent-events decoder,
//! and configuration.

pub mod config;
pub mod error;
pub mod event;
pub mod protocol;
pub mod sse;

pub use config::{CacheConfig, Config, RealtimeConfig, SyncConfig};
pub use error::{Error, Result};
pub use event::{Event, EventKind, Payload, Topic};
pub use protocol::ClientFrame;
pub use sse::SseDecoder;
