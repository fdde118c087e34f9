// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-process caching with per-entry expiry.

mod query;
mod store;

pub use query::{CachedQuery, Fetcher, QueryState};
pub use store::CacheStore;
