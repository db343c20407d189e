// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn message_role_display() {
    assert_eq!(MessageRole::Orchestrator.to_string(), "orchestrator");
}

#[test]
fn message_new_has_no_attachments() {
    let msg = Message::new(SessionId::new(), MessageRole::User, "hi", 1_000);
    assert!(msg.attachments.is_empty());
    assert_eq!(msg.content, "hi");
}

#[test]
fn message_serde_round_trips() {
    let msg = Message::builder().content("ping").build();
    let json = serde_json::to_string(&msg).unwrap();
    let back: Message = serde_json::from_str(&json).unwrap();
    assert_eq!(back.content, "ping");
    assert_eq!(back.role, msg.role);
}
