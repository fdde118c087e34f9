// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Host environment notifications that can trigger a flush.

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    /// The application regained focus.
    Focus,
    /// Network connectivity was restored.
    Online,
}

/// Fan-out hub for [`HostSignal`]s. Clones share subscribers.
#[derive(Clone)]
pub struct HostSignals {
    tx: broadcast::Sender<HostSignal>,
}

impl HostSignals {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        HostSignals { tx }
    }

    /// Deliver `signal` to every subscriber. Returns how many received it.
    pub fn notify(&self, signal: HostSignal) -> usize {
        self.tx.send(signal).unwrap_or(0)
    }

    pub fn focus(&self) -> usize {
        self.notify(HostSignal::Focus)
    }

    pub fn online(&self) -> usize {
        self.notify(HostSignal::Online)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostSignal> {
        self.tx.subscribe()
    }
}

impl Default for HostSignals {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
