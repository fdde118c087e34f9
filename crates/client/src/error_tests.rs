// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn core_errors_pass_through_unchanged() {
    let core = fieldsync_core::Error::Config("bad table".to_string());
    let expected = core.to_string();
    let err: Error = core.into();
    assert_eq!(err.to_string(), expected);
}

#[test]
fn transport_error_is_prefixed() {
    let err: Error = TransportError::ConnectionClosed.into();
    assert_eq!(err.to_string(), "transport error: connection closed");
}

#[test]
fn realtime_connect_error_shows_cause() {
    let err: Error =
        RealtimeError::Connect(TransportError::ConnectionFailed("refused".into())).into();
    assert_eq!(err.to_string(), "realtime error: connection failed: refused");
}

#[test]
fn sync_error_is_prefixed() {
    let err: Error = SyncError::Aborted("panicked".into()).into();
    assert_eq!(err.to_string(), "sync error: sync task aborted: panicked");
}

#[test]
fn exhausted_error_has_hint() {
    let msg = Error::ReconnectExhausted(5).to_string();
    assert!(msg.contains("after 5 tries"));
    assert!(msg.contains("hint:"));
}

#[test]
fn from_io_error() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: Error = io.into();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn box_error_converts_to_shared() {
    let boxed: BoxError = "offline".into();
    let shared: SharedError = Arc::from(boxed);
    let copy = Arc::clone(&shared);
    assert_eq!(copy.to_string(), "offline");
}
