// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn notify_without_subscribers_reaches_nobody() {
    let signals = HostSignals::new();
    assert_eq!(signals.focus(), 0);
}

#[tokio::test]
async fn every_subscriber_sees_each_signal() {
    let signals = HostSignals::new();
    let mut first = signals.subscribe();
    let mut second = signals.clone().subscribe();

    assert_eq!(signals.online(), 2);
    assert_eq!(signals.notify(HostSignal::Focus), 2);

    assert_eq!(first.recv().await.unwrap(), HostSignal::Online);
    assert_eq!(first.recv().await.unwrap(), HostSignal::Focus);
    assert_eq!(second.recv().await.unwrap(), HostSignal::Online);
}
