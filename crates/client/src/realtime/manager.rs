// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection lifecycle and reconnect state machine.
//!
//! The manager keeps at most one live transport. Each successful open spawns
//! a session task that owns the transport, pumps inbound frames onto the
//! event bus, forwards outbound frames and heartbeats, and hands control to
//! the reconnect logic when the transport closes.
//!
//! Every connect cycle is tied to a [`CancellationToken`]. `disconnect()` and
//! a manual `connect()` cancel the current token, which stops the session,
//! the heartbeat and any pending reconnect timer in one step.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use fieldsync_core::{ClientFrame, Event, Payload, RealtimeConfig, Topic};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval};
use tokio_util::sync::CancellationToken;

use super::bus::EventBus;
use super::channel::BroadcastChannel;
use super::transport::{
    EventStreamTransport, Transport, TransportError, TransportFactory, TransportKind,
    WebSocketTransport,
};
use crate::listeners::Subscription;

/// Error returned by [`ConnectionManager::connect`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum RealtimeError {
    /// The transport could not be opened.
    #[error(transparent)]
    Connect(#[from] TransportError),

    /// A `disconnect()` or newer `connect()` superseded this attempt.
    #[error("connection attempt cancelled")]
    Cancelled,
}

/// Where the connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport and nothing scheduled.
    Disconnected,
    /// A transport is being opened.
    Connecting,
    /// A transport is open.
    Connected,
    /// Waiting to start the given reconnect attempt.
    Reconnecting {
        /// Attempt number, starting at 1.
        attempt: u32,
    },
    /// Reconnect attempts ran out. Only a manual `connect()` leaves this state.
    Exhausted,
}

/// One logical real-time connection.
///
/// Handles are cheap clones of the same connection. A connected session
/// keeps the connection alive, so call [`disconnect`](Self::disconnect) to
/// tear it down.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

struct Shared {
    url: String,
    config: RealtimeConfig,
    factory: TransportFactory,
    bus: EventBus,
    lifecycle: Mutex<Lifecycle>,
}

struct Lifecycle {
    state: ConnectionState,
    attempts: u32,
    cancel: CancellationToken,
    outbound: Option<mpsc::UnboundedSender<String>>,
    session: Option<JoinHandle<()>>,
    /// Outcome of the open attempt started by the last move to `Connecting`.
    opening: Option<watch::Receiver<OpenOutcome>>,
}

/// `None` until the attempt settles.
type OpenOutcome = Option<Result<(), RealtimeError>>;

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ConnectionManager {
    /// Bidirectional WebSocket connection.
    pub fn websocket(url: impl Into<String>, config: RealtimeConfig) -> Self {
        Self::with_transport(url, config, WebSocketTransport::factory())
    }

    /// Receive-only server-sent event stream.
    pub fn event_stream(url: impl Into<String>, config: RealtimeConfig) -> Self {
        Self::with_transport(url, config, EventStreamTransport::factory())
    }

    /// Connection using transports produced by `factory`, one per attempt.
    pub fn with_transport(
        url: impl Into<String>,
        config: RealtimeConfig,
        factory: TransportFactory,
    ) -> Self {
        ConnectionManager {
            shared: Arc::new(Shared {
                url: url.into(),
                config,
                factory,
                bus: EventBus::new(),
                lifecycle: Mutex::new(Lifecycle {
                    state: ConnectionState::Disconnected,
                    attempts: 0,
                    cancel: CancellationToken::new(),
                    outbound: None,
                    session: None,
                    opening: None,
                }),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.shared.url
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.shared.config
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Reconnect attempts made since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.lock().attempts
    }

    /// Subscribe to events of one kind, or to every event with [`Topic::Any`].
    pub fn on<F>(&self, topic: impl Into<Topic>, callback: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.shared.bus.on(topic, callback)
    }

    /// Serialize `data` as JSON and send it if a bidirectional transport is open.
    ///
    /// Returns whether the frame was handed to the transport. Never fails;
    /// when disconnected the call is a no-op and nothing is queued.
    pub fn send<T: Serialize + ?Sized>(&self, data: &T) -> bool {
        let Some(outbound) = self.shared.lock().outbound.clone() else {
            return false;
        };
        match serde_json::to_string(data) {
            Ok(text) => outbound.send(text).is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "dropping unserializable outbound message");
                false
            }
        }
    }

    /// Open the connection.
    ///
    /// Returns once the transport is open and the `connect` event has been
    /// delivered. Errors only when this particular attempt fails to open;
    /// with `auto_reconnect` a failed attempt still schedules a retry in the
    /// background. A no-op while already connected. While another attempt
    /// is in flight, waits for that attempt and returns its outcome.
    pub async fn connect(&self) -> Result<(), RealtimeError> {
        let start = {
            let mut lc = self.shared.lock();
            match (lc.state, lc.opening.clone()) {
                (ConnectionState::Connected, _) => return Ok(()),
                // A closed channel means the attempt was abandoned; start over.
                (ConnectionState::Connecting, Some(opening))
                    if opening.has_changed().is_ok() =>
                {
                    Err(opening)
                }
                _ => {
                    lc.cancel.cancel();
                    lc.cancel = CancellationToken::new();
                    if lc.state == ConnectionState::Exhausted {
                        lc.attempts = 0;
                    }
                    let outcome = begin_connecting(&mut lc);
                    Ok((lc.cancel.clone(), lc.session.take(), outcome))
                }
            }
        };

        let (cancel, previous, outcome) = match start {
            Ok(start) => start,
            Err(opening) => return wait_for_open(opening).await,
        };

        // The previous transport must be fully closed before a new one opens.
        if let Some(session) = previous {
            let _ = session.await;
        }

        open(&self.shared, cancel, outcome).await
    }

    /// Tear down the connection from any state.
    ///
    /// Stops the heartbeat and any scheduled reconnect, closes the transport,
    /// and emits a final `disconnect` unless already disconnected.
    pub fn disconnect(&self) {
        let previous = {
            let mut lc = self.shared.lock();
            lc.cancel.cancel();
            lc.cancel = CancellationToken::new();
            lc.outbound = None;
            std::mem::replace(&mut lc.state, ConnectionState::Disconnected)
        };

        if previous != ConnectionState::Disconnected {
            tracing::info!(url = %self.shared.url, "disconnected by client");
            self.shared
                .bus
                .emit(&Event::disconnect(Some("client disconnect".to_string())));
        }
    }

    /// Re-emit every message another member posts on `channel` as an inbound
    /// `message` event. Unsubscribing stops the forwarding.
    pub fn attach_channel(&self, mut channel: BroadcastChannel) -> Subscription {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let forwarder = tokio::spawn(async move {
            while let Some(value) = channel.recv().await {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                shared.bus.emit(&Event::message(Payload::Json(value)));
            }
        });
        let abort = forwarder.abort_handle();
        Subscription::new(move || abort.abort())
    }
}

fn begin_connecting(lc: &mut Lifecycle) -> watch::Sender<OpenOutcome> {
    let (tx, rx) = watch::channel(None);
    lc.state = ConnectionState::Connecting;
    lc.opening = Some(rx);
    tx
}

async fn wait_for_open(mut opening: watch::Receiver<OpenOutcome>) -> Result<(), RealtimeError> {
    match opening.wait_for(Option::is_some).await {
        Ok(outcome) => outcome.clone().unwrap_or(Err(RealtimeError::Cancelled)),
        Err(_) => Err(RealtimeError::Cancelled),
    }
}

/// Run one open attempt and publish its outcome to concurrent `connect()` callers.
async fn open(
    shared: &Arc<Shared>,
    cancel: CancellationToken,
    outcome: watch::Sender<OpenOutcome>,
) -> Result<(), RealtimeError> {
    let result = try_open(shared, cancel).await;
    outcome.send_replace(Some(result.clone()));
    result
}

async fn try_open(shared: &Arc<Shared>, cancel: CancellationToken) -> Result<(), RealtimeError> {
    let mut transport = (shared.factory)();

    let result = tokio::select! {
        _ = cancel.cancelled() => return Err(RealtimeError::Cancelled),
        result = transport.connect(&shared.url) => result,
    };

    match result {
        Ok(()) => {
            let (opened_tx, opened_rx) = oneshot::channel();
            let rejected = {
                let mut lc = shared.lock();
                if cancel.is_cancelled() {
                    Some(transport)
                } else {
                    lc.state = ConnectionState::Connected;
                    lc.attempts = 0;
                    let outbound = if transport.kind() == TransportKind::Socket {
                        let (tx, rx) = mpsc::unbounded_channel();
                        lc.outbound = Some(tx);
                        Some(rx)
                    } else {
                        lc.outbound = None;
                        None
                    };
                    lc.session = Some(tokio::spawn(run_session(
                        Arc::clone(shared),
                        transport,
                        outbound,
                        cancel.clone(),
                        opened_tx,
                    )));
                    None
                }
            };

            if let Some(mut transport) = rejected {
                let _ = transport.disconnect().await;
                return Err(RealtimeError::Cancelled);
            }

            opened_rx.await.map_err(|_| RealtimeError::Cancelled)
        }
        Err(e) => {
            {
                let mut lc = shared.lock();
                if cancel.is_cancelled() {
                    return Err(RealtimeError::Cancelled);
                }
                lc.state = ConnectionState::Disconnected;
            }
            tracing::warn!(url = %shared.url, error = %e, "connection attempt failed");
            shared.bus.emit(&Event::error(e.to_string()));
            if shared.config.auto_reconnect {
                schedule_reconnect(shared, cancel);
            }
            Err(RealtimeError::Connect(e))
        }
    }
}

async fn run_session(
    shared: Arc<Shared>,
    mut transport: Box<dyn Transport>,
    mut outbound: Option<mpsc::UnboundedReceiver<String>>,
    cancel: CancellationToken,
    opened: oneshot::Sender<()>,
) {
    if cancel.is_cancelled() {
        let _ = transport.disconnect().await;
        return;
    }
    tracing::info!(url = %shared.url, "connected");
    shared.bus.emit(&Event::connect());
    let _ = opened.send(());

    let mut heartbeat = match (transport.kind(), shared.config.heartbeat_interval()) {
        (TransportKind::Socket, Some(period)) => {
            Some(tokio::time::interval_at(Instant::now() + period, period))
        }
        _ => None,
    };

    let reason = loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = transport.disconnect().await;
                return;
            }
            text = next_outbound(&mut outbound) => match text {
                Some(text) => {
                    if let Err(e) = transport.send(text).await {
                        shared.bus.emit(&Event::error(e.to_string()));
                        break Some(e.to_string());
                    }
                }
                None => outbound = None,
            },
            _ = next_tick(&mut heartbeat) => {
                match ClientFrame::ping().to_json() {
                    Ok(ping) => {
                        if let Err(e) = transport.send(ping).await {
                            shared.bus.emit(&Event::error(e.to_string()));
                            break Some(e.to_string());
                        }
                        tracing::trace!("heartbeat sent");
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to encode heartbeat"),
                }
            }
            frame = transport.recv() => match frame {
                Ok(Some(text)) => {
                    shared.bus.emit(&Event::message(Payload::from_inbound(&text)));
                }
                Ok(None) => break None,
                Err(e) => {
                    shared.bus.emit(&Event::error(e.to_string()));
                    break Some(e.to_string());
                }
            },
        }
    };

    let _ = transport.disconnect().await;
    handle_close(&shared, &cancel, reason);
}

async fn next_outbound(outbound: &mut Option<mpsc::UnboundedReceiver<String>>) -> Option<String> {
    match outbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn next_tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn handle_close(shared: &Arc<Shared>, cancel: &CancellationToken, reason: Option<String>) {
    {
        let mut lc = shared.lock();
        if cancel.is_cancelled() {
            return;
        }
        lc.state = ConnectionState::Disconnected;
        lc.outbound = None;
    }
    tracing::warn!(url = %shared.url, reason = ?reason, "connection closed");
    shared.bus.emit(&Event::disconnect(reason));
    if shared.config.auto_reconnect {
        schedule_reconnect(shared, cancel.clone());
    }
}

fn schedule_reconnect(shared: &Arc<Shared>, cancel: CancellationToken) {
    let max = shared.config.max_reconnect_attempts;
    let attempt = {
        let mut lc = shared.lock();
        if cancel.is_cancelled() {
            return;
        }
        lc.attempts = lc.attempts.saturating_add(1);
        if lc.attempts > max {
            lc.state = ConnectionState::Exhausted;
            None
        } else {
            lc.state = ConnectionState::Reconnecting {
                attempt: lc.attempts,
            };
            Some(lc.attempts)
        }
    };

    let Some(attempt) = attempt else {
        tracing::warn!(url = %shared.url, attempts = max, "giving up reconnecting");
        shared.bus.emit(&Event::reconnect_exhausted(max));
        return;
    };

    let delay = shared.config.reconnect_delay(attempt);
    tracing::info!(url = %shared.url, attempt, delay_ms = delay.as_millis() as u64, "reconnect scheduled");

    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
        shared.bus.emit(&Event::reconnect(attempt));
        let outcome = {
            let mut lc = shared.lock();
            if cancel.is_cancelled() {
                return;
            }
            begin_connecting(&mut lc)
        };
        if let Err(e) = open(&shared, cancel, outcome).await {
            tracing::debug!(attempt, error = %e, "reconnect attempt failed");
        }
    });
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
