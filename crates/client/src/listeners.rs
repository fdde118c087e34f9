// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Keyed listener registries with detachable subscriptions.
//!
//! A [`Registry`] maps a key to an ordered list of callbacks. Emitting a value
//! for a key invokes that key's callbacks synchronously, in registration order.
//! Callbacks run on a snapshot taken before the first one is invoked and with
//! the registry lock released, so a callback may subscribe or unsubscribe
//! freely; such changes take effect from the next emission.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

/// A registered callback.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Ordered callbacks grouped by key.
pub struct Registry<K, T> {
    inner: Arc<Mutex<RegistryInner<K, T>>>,
}

struct RegistryInner<K, T> {
    next_id: u64,
    listeners: HashMap<K, Vec<(u64, Listener<T>)>>,
}

impl<K, T> Clone for Registry<K, T> {
    fn clone(&self) -> Self {
        Registry {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, T> Default for Registry<K, T> {
    fn default() -> Self {
        Registry {
            inner: Arc::new(Mutex::new(RegistryInner {
                next_id: 0,
                listeners: HashMap::new(),
            })),
        }
    }
}

impl<K, T> Registry<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: 'static,
{
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner<K, T>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a callback for `key`.
    ///
    /// The returned [`Subscription`] removes exactly this callback when
    /// unsubscribed. Dropping it without unsubscribing keeps the callback.
    pub fn subscribe<F>(&self, key: K, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut inner = self.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner
                .listeners
                .entry(key.clone())
                .or_default()
                .push((id, Arc::new(callback)));
            id
        };

        let registry = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            let Some(registry) = registry.upgrade() else {
                return;
            };
            let mut inner = registry.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(list) = inner.listeners.get_mut(&key) {
                list.retain(|(listener_id, _)| *listener_id != id);
                if list.is_empty() {
                    inner.listeners.remove(&key);
                }
            }
        })
    }

    /// Invoke every callback registered for `key`, in registration order.
    ///
    /// Returns the number of callbacks invoked.
    pub fn emit(&self, key: &K, value: &T) -> usize {
        let snapshot: Vec<Listener<T>> = {
            let inner = self.lock();
            match inner.listeners.get(key) {
                Some(list) => list.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
                None => Vec::new(),
            }
        };

        for callback in &snapshot {
            callback(value);
        }
        snapshot.len()
    }

    /// Number of callbacks registered for `key`.
    pub fn listener_count(&self, key: &K) -> usize {
        self.lock().listeners.get(key).map_or(0, Vec::len)
    }

    /// Remove every callback for every key.
    pub fn clear(&self) {
        self.lock().listeners.clear();
    }
}

/// Handle returned by `on`-style registration methods.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new<F>(detach: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Subscription {
            detach: Some(Box::new(detach)),
        }
    }

    /// Remove the callback this subscription was created for.
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "listeners_tests.rs"]
mod tests;
