// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use weave_core::SessionId;

#[tokio::test]
async fn subscriber_receives_published_event() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    bus.publish(OutboundEvent::SessionResumed { id: SessionId::new() });
    let event = rx.recv().await.unwrap();
    assert!(matches!(event, OutboundEvent::SessionResumed { .. }));
}

#[tokio::test]
async fn multiple_subscribers_all_see_the_same_event() {
    let bus = EventBus::new();
    let mut a = bus.subscribe();
    let mut b = bus.subscribe();
    bus.publish(OutboundEvent::SessionPaused { id: SessionId::new(), reason: "ask".into() });
    assert!(matches!(a.recv().await.unwrap(), OutboundEvent::SessionPaused { .. }));
    assert!(matches!(b.recv().await.unwrap(), OutboundEvent::SessionPaused { .. }));
}

#[test]
fn publish_with_no_subscribers_does_not_error() {
    let bus = EventBus::new();
    assert_eq!(bus.publish(OutboundEvent::SessionResumed { id: SessionId::new() }), 0);
}

#[tokio::test]
async fn clone_shares_the_same_channel() {
    let bus = EventBus::new();
    let clone = bus.clone();
    let mut rx = bus.subscribe();
    clone.publish(OutboundEvent::SessionResumed { id: SessionId::new() });
    assert!(rx.recv().await.is_ok());
}
