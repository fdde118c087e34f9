// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::realtime::mock::{Frame, MockControl};
use crate::realtime::ChannelHub;
use fieldsync_core::EventKind;
use serde_json::json;
use std::time::Duration;

fn config() -> RealtimeConfig {
    RealtimeConfig {
        reconnect_delay_ms: 100,
        heartbeat_interval_ms: 0,
        ..RealtimeConfig::default()
    }
}

fn manager(control: &MockControl, config: RealtimeConfig) -> ConnectionManager {
    ConnectionManager::with_transport("ws://barn.local/live", config, control.factory())
}

fn record(manager: &ConnectionManager) -> Arc<Mutex<Vec<Event>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    // Recorder stays registered for the whole test.
    let _ = manager.on(Topic::Any, move |event| sink.lock().unwrap().push(event.clone()));
    log
}

fn kinds(log: &Arc<Mutex<Vec<Event>>>) -> Vec<EventKind> {
    log.lock().unwrap().iter().map(|e| e.kind).collect()
}

fn count(log: &Arc<Mutex<Vec<Event>>>, kind: EventKind) -> usize {
    log.lock().unwrap().iter().filter(|e| e.kind == kind).count()
}

/// Let spawned tasks run until the runtime is idle.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn connect_emits_connect_event() {
    let control = MockControl::socket();
    let manager = manager(&control, config());
    let log = record(&manager);

    manager.connect().await.unwrap();

    assert_eq!(manager.state(), ConnectionState::Connected);
    assert!(manager.is_connected());
    assert_eq!(manager.reconnect_attempts(), 0);
    assert_eq!(kinds(&log), vec![EventKind::Connect]);
    assert_eq!(control.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn connect_while_connected_is_noop() {
    let control = MockControl::socket();
    let manager = manager(&control, config());

    manager.connect().await.unwrap();
    manager.connect().await.unwrap();

    assert_eq!(control.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_connect_shares_failed_attempt() {
    let control = MockControl::socket();
    control.set_connect_delay(Duration::from_millis(50));
    control.set_connect_fail(true);
    let manager = manager(
        &control,
        RealtimeConfig {
            auto_reconnect: false,
            ..config()
        },
    );

    let (first, second) = tokio::join!(manager.connect(), manager.connect());

    assert!(matches!(first, Err(RealtimeError::Connect(_))));
    assert!(matches!(second, Err(RealtimeError::Connect(_))));
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert_eq!(control.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_connect_shares_successful_attempt() {
    let control = MockControl::socket();
    control.set_connect_delay(Duration::from_millis(50));
    let manager = manager(&control, config());
    let log = record(&manager);

    let (first, second) = tokio::join!(manager.connect(), manager.connect());

    first.unwrap();
    second.unwrap();
    assert!(manager.is_connected());
    assert_eq!(control.connects(), 1);
    assert_eq!(count(&log, EventKind::Connect), 1);
}

#[tokio::test(start_paused = true)]
async fn disconnect_cancels_every_waiting_connect() {
    let control = MockControl::socket();
    control.set_connect_delay(Duration::from_millis(50));
    let manager = manager(&control, config());

    let waiter = manager.clone();
    let (first, second, ()) = tokio::join!(manager.connect(), manager.connect(), async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        waiter.disconnect();
    });

    assert!(matches!(first, Err(RealtimeError::Cancelled)));
    assert!(matches!(second, Err(RealtimeError::Cancelled)));
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn inbound_messages_are_json_or_raw() {
    let control = MockControl::socket();
    let manager = manager(&control, config());
    let log = record(&manager);
    manager.connect().await.unwrap();

    control.text(r#"{"table":"livestock","id":12}"#);
    control.text("not json at all");
    settle().await;

    let events = log.lock().unwrap().clone();
    let payloads: Vec<_> = events
        .iter()
        .filter(|e| e.kind == EventKind::Message)
        .map(|e| e.payload.clone().unwrap())
        .collect();
    assert_eq!(
        payloads,
        vec![
            Payload::Json(json!({"table": "livestock", "id": 12})),
            Payload::Raw("not json at all".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn send_serializes_when_connected() {
    let control = MockControl::socket();
    let manager = manager(&control, config());
    manager.connect().await.unwrap();

    assert!(manager.send(&json!({"op": "upsert", "id": 4})));
    assert!(manager.send("hello"));
    settle().await;

    assert_eq!(
        control.sent(),
        vec![
            r#"{"id":4,"op":"upsert"}"#.to_string(),
            r#""hello""#.to_string()
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn send_when_disconnected_is_silent_noop() {
    let control = MockControl::socket();
    let manager = manager(&control, config());
    let log = record(&manager);

    assert!(!manager.send(&json!({"op": "upsert"})));
    settle().await;

    assert!(control.sent().is_empty());
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn heartbeat_pings_on_interval() {
    let control = MockControl::socket();
    let manager = manager(
        &control,
        RealtimeConfig {
            heartbeat_interval_ms: 30_000,
            ..config()
        },
    );
    manager.connect().await.unwrap();

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert!(control.sent().is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(control.sent(), vec![r#"{"type":"ping"}"#.to_string()]);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(control.sent().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn stream_variant_is_receive_only() {
    let control = MockControl::stream();
    let manager = manager(
        &control,
        RealtimeConfig {
            heartbeat_interval_ms: 1000,
            ..config()
        },
    );
    let log = record(&manager);
    manager.connect().await.unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!manager.send(&json!({"op": "upsert"})));
    assert!(control.sent().is_empty());

    control.text(r#"{"seq":1}"#);
    settle().await;
    assert_eq!(kinds(&log), vec![EventKind::Connect, EventKind::Message]);
}

#[tokio::test(start_paused = true)]
async fn unexpected_close_reconnects_after_delay() {
    let control = MockControl::socket();
    let manager = manager(&control, config());
    let log = record(&manager);
    manager.connect().await.unwrap();

    control.close();
    settle().await;
    assert_eq!(kinds(&log), vec![EventKind::Connect, EventKind::Disconnect]);
    assert_eq!(
        manager.state(),
        ConnectionState::Reconnecting { attempt: 1 }
    );

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(
        kinds(&log),
        vec![
            EventKind::Connect,
            EventKind::Disconnect,
            EventKind::Reconnect,
            EventKind::Connect
        ]
    );
    assert_eq!(manager.state(), ConnectionState::Connected);
    assert_eq!(manager.reconnect_attempts(), 0);
    assert_eq!(control.connects(), 2);
}

#[tokio::test(start_paused = true)]
async fn reconnect_ceiling_emits_one_terminal_error() {
    let control = MockControl::socket();
    control.set_connect_fail(true);
    let manager = manager(
        &control,
        RealtimeConfig {
            max_reconnect_attempts: 3,
            ..config()
        },
    );
    let log = record(&manager);

    let result = manager.connect().await;
    assert!(matches!(result, Err(RealtimeError::Connect(_))));

    tokio::time::sleep(Duration::from_secs(10)).await;

    let events = log.lock().unwrap().clone();
    let terminal: Vec<_> = events.iter().filter(|e| e.is_reconnect_exhausted()).collect();
    assert_eq!(terminal.len(), 1);
    assert_eq!(
        terminal[0].payload,
        Some(Payload::Exhausted { attempts: 3 })
    );
    assert_eq!(count(&log, EventKind::Reconnect), 3);
    assert_eq!(control.connects(), 4);
    assert_eq!(manager.state(), ConnectionState::Exhausted);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(control.connects(), 4);
    assert_eq!(log.lock().unwrap().len(), events.len());
}

#[tokio::test(start_paused = true)]
async fn reconnect_delay_grows_linearly() {
    let control = MockControl::socket();
    control.set_connect_fail(true);
    let manager = manager(&control, config());
    let _ = manager.connect().await;

    // Attempt 1 at 100ms, attempt 2 at 100 + 200 = 300ms.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(control.connects(), 2);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(control.connects(), 2);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(control.connects(), 3);
}

#[tokio::test(start_paused = true)]
async fn manual_connect_after_exhaustion_resets_counter() {
    let control = MockControl::socket();
    control.set_connect_fail(true);
    let manager = manager(
        &control,
        RealtimeConfig {
            max_reconnect_attempts: 1,
            ..config()
        },
    );
    let _ = manager.connect().await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(manager.state(), ConnectionState::Exhausted);

    control.set_connect_fail(false);
    manager.connect().await.unwrap();

    assert_eq!(manager.state(), ConnectionState::Connected);
    assert_eq!(manager.reconnect_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn auto_reconnect_disabled_stays_down() {
    let control = MockControl::socket();
    let manager = manager(
        &control,
        RealtimeConfig {
            auto_reconnect: false,
            ..config()
        },
    );
    let log = record(&manager);
    manager.connect().await.unwrap();

    control.close();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert_eq!(control.connects(), 1);
    assert_eq!(count(&log, EventKind::Reconnect), 0);
}

#[tokio::test(start_paused = true)]
async fn inbound_error_emits_error_then_disconnect() {
    let control = MockControl::socket();
    let manager = manager(
        &control,
        RealtimeConfig {
            auto_reconnect: false,
            ..config()
        },
    );
    let log = record(&manager);
    manager.connect().await.unwrap();

    control.push(Frame::Error("connection reset".into()));
    settle().await;

    assert_eq!(
        kinds(&log),
        vec![EventKind::Connect, EventKind::Error, EventKind::Disconnect]
    );
}

#[tokio::test(start_paused = true)]
async fn disconnect_is_idempotent() {
    let control = MockControl::socket();
    let manager = manager(&control, config());
    let log = record(&manager);
    manager.connect().await.unwrap();

    manager.disconnect();
    manager.disconnect();
    settle().await;

    assert_eq!(count(&log, EventKind::Disconnect), 1);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert_eq!(control.disconnects(), 1);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(control.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn disconnect_on_fresh_manager_emits_nothing() {
    let control = MockControl::socket();
    let manager = manager(&control, config());
    let log = record(&manager);

    manager.disconnect();
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn disconnect_cancels_pending_reconnect() {
    let control = MockControl::socket();
    let manager = manager(&control, config());
    let log = record(&manager);
    manager.connect().await.unwrap();

    control.close();
    settle().await;
    assert!(matches!(
        manager.state(),
        ConnectionState::Reconnecting { .. }
    ));

    manager.disconnect();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(control.connects(), 1);
    assert_eq!(count(&log, EventKind::Reconnect), 0);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn reconnect_after_disconnect_opens_fresh_transport() {
    let control = MockControl::socket();
    let manager = manager(&control, config());
    manager.connect().await.unwrap();

    manager.disconnect();
    manager.connect().await.unwrap();

    assert_eq!(control.connects(), 2);
    assert_eq!(control.disconnects(), 1);
    assert!(manager.is_connected());
}

#[tokio::test(start_paused = true)]
async fn unsubscribed_listener_stops_receiving() {
    let control = MockControl::socket();
    let manager = manager(&control, config());
    let hits = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&hits);
    let sub = manager.on(EventKind::Message, move |_| *counter.lock().unwrap() += 1);
    manager.connect().await.unwrap();

    control.text("one");
    settle().await;
    sub.unsubscribe();
    control.text("two");
    settle().await;

    assert_eq!(*hits.lock().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn attached_channel_messages_become_events() {
    let control = MockControl::socket();
    let manager = manager(&control, config());
    let log = record(&manager);

    let hub = ChannelHub::new();
    let ours = hub.join("herd-updates");
    let theirs = hub.join("herd-updates");
    let sub = manager.attach_channel(ours);

    theirs.post(&json!({"moved": 3}));
    settle().await;
    assert_eq!(
        log.lock().unwrap()[0].payload,
        Some(Payload::Json(json!({"moved": 3})))
    );

    sub.unsubscribe();
    settle().await;
    theirs.post(&json!({"moved": 4}));
    settle().await;
    assert_eq!(count(&log, EventKind::Message), 1);
}
