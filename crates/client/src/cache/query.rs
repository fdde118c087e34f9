// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read-through access to a single cache key.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};

use super::store::CacheStore;
use crate::error::{BoxError, SharedError};

/// Caller-supplied loader invoked on a cache miss.
pub type Fetcher<V> = Arc<dyn Fn() -> BoxFuture<'static, Result<V, BoxError>> + Send + Sync>;

/// Observable state of a [`CachedQuery`].
#[derive(Debug, Clone)]
pub struct QueryState<V> {
    /// Most recently loaded value.
    pub data: Option<V>,
    /// A fetch is in flight.
    pub loading: bool,
    /// Error from the most recent fetch, cleared when the next one starts.
    pub error: Option<SharedError>,
}

impl<V> Default for QueryState<V> {
    fn default() -> Self {
        QueryState {
            data: None,
            loading: false,
            error: None,
        }
    }
}

/// Serves one key from a [`CacheStore`], fetching and caching on a miss.
///
/// Fetch failures are recorded in the state and never cached. A failed fetch
/// leaves any previously loaded value in place.
pub struct CachedQuery<V> {
    cache: CacheStore<V>,
    key: String,
    ttl: Option<Duration>,
    fetcher: Fetcher<V>,
    state: Arc<Mutex<QueryState<V>>>,
}

impl<V> Clone for CachedQuery<V> {
    fn clone(&self) -> Self {
        CachedQuery {
            cache: self.cache.clone(),
            key: self.key.clone(),
            ttl: self.ttl,
            fetcher: Arc::clone(&self.fetcher),
            state: Arc::clone(&self.state),
        }
    }
}

impl<V> CachedQuery<V>
where
    V: Clone + Send + 'static,
{
    pub fn new<F, Fut>(
        cache: CacheStore<V>,
        key: impl Into<String>,
        ttl: Option<Duration>,
        fetcher: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, BoxError>> + Send + 'static,
    {
        CachedQuery {
            cache,
            key: key.into(),
            ttl,
            fetcher: Arc::new(move || fetcher().boxed()),
            state: Arc::new(Mutex::new(QueryState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueryState<V>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Cached value if fresh, otherwise the fetcher's result.
    pub async fn load(&self) -> Result<V, SharedError> {
        if let Some(value) = self.cache.get(&self.key) {
            let mut state = self.lock();
            state.data = Some(value.clone());
            state.error = None;
            return Ok(value);
        }
        self.fetch().await
    }

    /// Fetch and re-cache regardless of what the cache holds.
    pub async fn refetch(&self) -> Result<V, SharedError> {
        self.fetch().await
    }

    /// Drop the cached value so the next [`load`](Self::load) fetches.
    pub fn invalidate(&self) {
        self.cache.delete(&self.key);
    }

    pub fn state(&self) -> QueryState<V> {
        self.lock().clone()
    }

    pub fn data(&self) -> Option<V> {
        self.lock().data.clone()
    }

    pub fn error(&self) -> Option<SharedError> {
        self.lock().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    async fn fetch(&self) -> Result<V, SharedError> {
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
        }

        let result = (self.fetcher)().await;

        let mut state = self.lock();
        state.loading = false;
        match result {
            Ok(value) => {
                self.cache.set(self.key.clone(), value.clone(), self.ttl);
                state.data = Some(value.clone());
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "cache fetch failed");
                let shared: SharedError = Arc::from(e);
                state.error = Some(Arc::clone(&shared));
                Err(shared)
            }
        }
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
