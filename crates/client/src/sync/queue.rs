// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Debounced write-behind queue.
//!
//! Items are delivered to the sync function one at a time, in enqueue order.
//! A failure puts the entire in-flight batch back at the front of the queue
//! so nothing is lost and order is preserved. Flushes never overlap.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use fieldsync_core::SyncConfig;
use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::AbortHandle;

use super::signals::{HostSignal, HostSignals};
use crate::error::BoxError;
use crate::listeners::{Registry, Subscription};

/// Remote sink invoked once per queued item.
pub type SyncFn<P, R> = Arc<dyn Fn(P) -> BoxFuture<'static, Result<R, BoxError>> + Send + Sync>;

/// A pending mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncItem<P> {
    pub key: String,
    pub data: P,
    pub queued_at: DateTime<Utc>,
}

/// Error returned by [`SyncQueue::sync`].
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The sync function rejected an item. The whole batch was requeued.
    ///
    /// `confirmed` items before the failing one had already succeeded and
    /// their listeners were notified.
    #[error("sync failed for '{key}' after {confirmed} confirmed item(s): {source}")]
    Flush {
        key: String,
        confirmed: usize,
        #[source]
        source: BoxError,
    },

    /// The flush task ended without reporting a result.
    #[error("sync task aborted: {0}")]
    Aborted(String),
}

/// Debounced, ordered queue of mutations for a remote sink.
///
/// Must be used inside a Tokio runtime. Clones are handles to the same queue.
pub struct SyncQueue<P, R> {
    inner: Arc<QueueInner<P, R>>,
}

impl<P, R> Clone for SyncQueue<P, R> {
    fn clone(&self) -> Self {
        SyncQueue {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct QueueInner<P, R> {
    sync_fn: SyncFn<P, R>,
    config: SyncConfig,
    pending: Mutex<Vec<SyncItem<P>>>,
    listeners: Registry<String, R>,
    timers: Mutex<Timers>,
    flushing: tokio::sync::Mutex<()>,
}

#[derive(Default)]
struct Timers {
    debounce: Option<AbortHandle>,
    watchers: Vec<AbortHandle>,
}

impl Timers {
    fn cancel_all(&mut self) {
        if let Some(debounce) = self.debounce.take() {
            debounce.abort();
        }
        for watcher in self.watchers.drain(..) {
            watcher.abort();
        }
    }
}

impl<P, R> Drop for QueueInner<P, R> {
    fn drop(&mut self) {
        self.timers
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .cancel_all();
    }
}

impl<P, R> QueueInner<P, R>
where
    P: Clone + Send + 'static,
    R: Send + 'static,
{
    fn lock_pending(&self) -> MutexGuard<'_, Vec<SyncItem<P>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_timers(&self) -> MutexGuard<'_, Timers> {
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn flush(self: Arc<Self>) -> Result<usize, SyncError> {
        let _flushing = self.flushing.lock().await;

        let batch = std::mem::take(&mut *self.lock_pending());
        if batch.is_empty() {
            return Ok(0);
        }
        tracing::debug!(items = batch.len(), "flushing sync queue");

        for index in 0..batch.len() {
            let key = batch[index].key.clone();
            match (self.sync_fn)(batch[index].data.clone()).await {
                Ok(result) => {
                    self.listeners.emit(&key, &result);
                }
                Err(source) => {
                    let requeued = batch.len();
                    {
                        let mut pending = self.lock_pending();
                        let newer = std::mem::replace(&mut *pending, batch);
                        pending.extend(newer);
                    }
                    tracing::warn!(
                        key = %key,
                        confirmed = index,
                        requeued,
                        error = %source,
                        "sync flush failed, batch requeued"
                    );
                    return Err(SyncError::Flush {
                        key,
                        confirmed: index,
                        source,
                    });
                }
            }
        }

        tracing::info!("Flushed {} queued operations", batch.len());
        Ok(batch.len())
    }
}

/// Run a flush in the background, logging instead of returning its error.
fn spawn_flush<P, R>(inner: Arc<QueueInner<P, R>>, trigger: &'static str)
where
    P: Clone + Send + 'static,
    R: Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = inner.flush().await {
            tracing::warn!(trigger, error = %e, "background sync failed");
        }
    });
}

impl<P, R> SyncQueue<P, R>
where
    P: Clone + Send + 'static,
    R: Send + 'static,
{
    pub fn new<F, Fut>(sync_fn: F, config: SyncConfig) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, BoxError>> + Send + 'static,
    {
        SyncQueue {
            inner: Arc::new(QueueInner {
                sync_fn: Arc::new(move |data| sync_fn(data).boxed()),
                config,
                pending: Mutex::new(Vec::new()),
                listeners: Registry::new(),
                timers: Mutex::new(Timers::default()),
                flushing: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Append a mutation and restart the debounce timer.
    pub fn queue(&self, key: impl Into<String>, data: P) {
        self.inner.lock_pending().push(SyncItem {
            key: key.into(),
            data,
            queued_at: Utc::now(),
        });
        self.restart_debounce();
    }

    fn restart_debounce(&self) {
        let delay = self.inner.config.debounce();
        let inner = Arc::downgrade(&self.inner);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = inner.upgrade() {
                // Detached so a later restart cannot abort a running flush.
                spawn_flush(inner, "debounce");
            }
        });

        let mut timers = self.inner.lock_timers();
        if let Some(previous) = timers.debounce.replace(timer.abort_handle()) {
            previous.abort();
        }
    }

    /// Flush everything pending now.
    ///
    /// Returns the number of items delivered. The flush keeps running even
    /// if the returned future is dropped.
    pub async fn sync(&self) -> Result<usize, SyncError> {
        let flush = tokio::spawn(Arc::clone(&self.inner).flush());
        flush
            .await
            .map_err(|e| SyncError::Aborted(e.to_string()))?
    }

    /// Called with the sync function's result for every delivered item
    /// queued under `key`.
    pub fn on<F>(&self, key: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&R) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(key.into(), callback)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock_pending().len()
    }

    /// Snapshot of the pending items in delivery order.
    pub fn pending(&self) -> Vec<SyncItem<P>> {
        self.inner.lock_pending().clone()
    }

    /// Flush when `signals` reports focus or connectivity, as enabled by
    /// `sync_on_focus` / `sync_on_online`. Does nothing if both are off.
    pub fn watch_host(&self, signals: &HostSignals) {
        let on_focus = self.inner.config.sync_on_focus;
        let on_online = self.inner.config.sync_on_online;
        if !on_focus && !on_online {
            return;
        }

        let mut rx = signals.subscribe();
        let inner = Arc::downgrade(&self.inner);
        let watcher = tokio::spawn(async move {
            loop {
                let signal = match rx.recv().await {
                    Ok(signal) => signal,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "host signal watcher lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let (wanted, trigger) = match signal {
                    HostSignal::Focus => (on_focus, "focus"),
                    HostSignal::Online => (on_online, "online"),
                };
                if !wanted {
                    continue;
                }
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                spawn_flush(inner, trigger);
            }
        });
        self.inner
            .lock_timers()
            .watchers
            .push(watcher.abort_handle());
    }

    /// Cancel timers and watchers, drop pending items and subscriptions.
    ///
    /// A flush already in progress runs to completion.
    pub fn destroy(&self) {
        self.inner.lock_timers().cancel_all();
        self.inner.lock_pending().clear();
        self.inner.listeners.clear();
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
