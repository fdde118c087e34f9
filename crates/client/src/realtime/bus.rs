// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Topic-based event fan-out.

use fieldsync_core::{Event, Topic};

use crate::listeners::{Registry, Subscription};

/// Delivers connection events to subscribers.
///
/// Listeners for the event's own kind run first, in registration order,
/// followed by wildcard listeners in registration order.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Registry<Topic, Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a single kind or to [`Topic::Any`].
    pub fn on<F>(&self, topic: impl Into<Topic>, callback: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.listeners.subscribe(topic.into(), callback)
    }

    /// Deliver an event. Returns the number of listeners invoked.
    pub fn emit(&self, event: &Event) -> usize {
        let specific = self.listeners.emit(&Topic::Kind(event.kind), event);
        let wildcard = self.listeners.emit(&Topic::Any, event);
        specific + wildcard
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
