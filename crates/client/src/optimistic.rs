// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Optimistic updates with rollback.
//!
//! [`Optimistic::update`] shows the new value immediately, then asks the
//! remote side to confirm it. A confirmed value (which may differ from the
//! tentative one) replaces it; a rejection restores the value that was
//! current when the update began and records the error.
//!
//! Each update captures its own rollback value. Overlapping updates on one
//! instance are not serialized, so a late rejection can restore a value that
//! an earlier update has since replaced.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::{BoxFuture, FutureExt};

use crate::error::{BoxError, SharedError};

/// Remote call confirming a tentative value.
pub type UpdateFn<T> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<T, BoxError>> + Send + Sync>;

/// Point-in-time view of an [`Optimistic`] value.
#[derive(Debug, Clone)]
pub struct OptimisticState<T> {
    pub data: T,
    pub pending: bool,
    pub error: Option<SharedError>,
}

/// A value updated locally first and confirmed remotely.
pub struct Optimistic<T> {
    state: Arc<Mutex<OptimisticState<T>>>,
    update_fn: UpdateFn<T>,
}

impl<T> Clone for Optimistic<T> {
    fn clone(&self) -> Self {
        Optimistic {
            state: Arc::clone(&self.state),
            update_fn: Arc::clone(&self.update_fn),
        }
    }
}

impl<T> Optimistic<T>
where
    T: Clone + Send + 'static,
{
    pub fn new<F, Fut>(initial: T, update_fn: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        Optimistic {
            state: Arc::new(Mutex::new(OptimisticState {
                data: initial,
                pending: false,
                error: None,
            })),
            update_fn: Arc::new(move |value| update_fn(value).boxed()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OptimisticState<T>> {
        lock_state(&self.state)
    }

    /// Current best-known value, tentative while an update is pending.
    pub fn data(&self) -> T {
        self.lock().data.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }

    /// Error from the most recent rejected update.
    pub fn error(&self) -> Option<SharedError> {
        self.lock().error.clone()
    }

    pub fn snapshot(&self) -> OptimisticState<T> {
        self.lock().clone()
    }

    /// Apply `value` now and confirm it remotely.
    ///
    /// Rejections are recorded in [`error`](Self::error), never returned.
    /// The remote call runs to completion even if this future is dropped.
    pub async fn update(&self, value: T) {
        let rollback = {
            let mut state = self.lock();
            state.pending = true;
            state.error = None;
            std::mem::replace(&mut state.data, value.clone())
        };

        let restore = rollback.clone();
        let state = Arc::clone(&self.state);
        let update_fn = Arc::clone(&self.update_fn);
        let call = tokio::spawn(async move {
            let result = update_fn(value).await;
            let mut state = lock_state(&state);
            state.pending = false;
            match result {
                Ok(confirmed) => state.data = confirmed,
                Err(e) => {
                    tracing::warn!(error = %e, "optimistic update rejected, rolling back");
                    state.data = rollback;
                    state.error = Some(Arc::from(e));
                }
            }
        });

        if let Err(e) = call.await {
            tracing::warn!(error = %e, "optimistic update task ended abnormally, rolling back");
            let mut state = self.lock();
            state.pending = false;
            state.data = restore;
            state.error = Some(Arc::new(e));
        }
    }
}

fn lock_state<T>(state: &Mutex<OptimisticState<T>>) -> MutexGuard<'_, OptimisticState<T>> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
#[path = "optimistic_tests.rs"]
mod tests;
