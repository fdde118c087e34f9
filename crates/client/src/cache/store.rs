// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! TTL cache with background sweep eviction.
//!
//! An entry is logically absent as soon as its TTL has elapsed. Reads evict
//! such entries lazily; a background task removes the rest every sweep
//! interval. Entries stored without a TTL never expire.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use fieldsync_core::CacheConfig;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Option<Duration>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.inserted_at) > ttl,
            None => false,
        }
    }
}

struct CacheInner<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    sweeper: CancellationToken,
}

impl<V> CacheInner<V> {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }
}

impl<V> Drop for CacheInner<V> {
    fn drop(&mut self) {
        self.sweeper.cancel();
    }
}

/// Shared key/value cache. Clones are handles to the same store.
///
/// Must be created inside a Tokio runtime; the sweep task starts immediately
/// and stops on [`destroy`](Self::destroy) or when the last handle drops.
pub struct CacheStore<V> {
    inner: Arc<CacheInner<V>>,
}

impl<V> Clone for CacheStore<V> {
    fn clone(&self) -> Self {
        CacheStore {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> CacheStore<V>
where
    V: Clone + Send + 'static,
{
    pub fn new(sweep_interval: Duration) -> Self {
        let period = sweep_interval.max(Duration::from_millis(1));
        let inner = Arc::new(CacheInner {
            entries: Mutex::new(HashMap::new()),
            sweeper: CancellationToken::new(),
        });
        spawn_sweeper(Arc::downgrade(&inner), inner.sweeper.clone(), period);
        CacheStore { inner }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.sweep_interval())
    }

    /// Value for `key`, unless absent or expired. Expired entries are removed.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.inner.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Store `value`, replacing any existing entry and restarting its clock.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.inner.lock().insert(
            key.into(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.inner.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Remove `key`. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Physical entry count, including expired entries not yet swept.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired entry now. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }

    /// Stop the sweep task and drop every entry.
    pub fn destroy(&self) {
        self.inner.sweeper.cancel();
        self.clear();
    }
}

fn spawn_sweeper<V: Send + 'static>(
    inner: Weak<CacheInner<V>>,
    cancel: CancellationToken,
    period: Duration,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(inner) = inner.upgrade() else {
                        break;
                    };
                    let evicted = inner.sweep();
                    if evicted > 0 {
                        tracing::debug!(evicted, "swept expired cache entries");
                    }
                }
            }
        }
    });
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
