// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Write-behind synchronization of local mutations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  queue   ┌─────────────┐  sync fn  ┌─────────────┐
//! │   Caller    │─────────►│  SyncQueue  │──────────►│   Remote    │
//! └─────────────┘          └─────────────┘           └─────────────┘
//!                             ▲       │
//!                 focus/online│       │ per-key results
//!                ┌────────────┴┐      ▼
//!                │ HostSignals │   listeners
//!                └─────────────┘
//! ```
//!
//! # Features
//!
//! - Debounced flush after a burst of writes
//! - Strictly ordered, sequential delivery
//! - Whole-batch requeue on failure
//! - Optional flush on focus / connectivity signals

mod queue;
mod signals;

pub use queue::{SyncError, SyncFn, SyncItem, SyncQueue};
pub use signals::{HostSignal, HostSignals};
