// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use fieldsync_core::Payload;
use serde_json::{json, Value};

#[test]
fn event_line_is_single_json_object() {
    let line = format_event(&Event::message(Payload::from_inbound(r#"{"id":3}"#))).unwrap();
    assert!(!line.contains('\n'));

    let value: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["kind"], "message");
    assert_eq!(value["payload"], json!({"type": "json", "value": {"id": 3}}));
}

#[tokio::test]
async fn refused_connect_without_retry_is_an_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = RealtimeConfig {
        auto_reconnect: false,
        ..RealtimeConfig::default()
    };

    let result = run(format!("ws://127.0.0.1:{port}"), false, Topic::Any, config).await;
    assert!(matches!(result, Err(Error::Realtime(_))));
}

#[tokio::test]
async fn exhausted_reconnects_end_the_session() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = RealtimeConfig {
        max_reconnect_attempts: 1,
        reconnect_delay_ms: 10,
        ..RealtimeConfig::default()
    };

    let result = run(format!("ws://127.0.0.1:{port}"), false, Topic::Any, config).await;
    assert!(matches!(result, Err(Error::ReconnectExhausted(1))));
}
