// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::message::MessageRole;

fn push_n(session: &mut Session, n: usize) {
    for i in 0..n {
        session.append_message(
            Message::new(session.id, MessageRole::User, format!("msg-{i}"), i as u64),
            i as u64,
        );
    }
}

#[test]
fn new_root_session_is_its_own_root() {
    let session = Session::new_root(std::path::PathBuf::from("/proj"), 0);
    assert_eq!(session.root_session_id, session.id);
    assert!(session.is_root());
}

#[test]
fn sub_session_inherits_root_and_records_parent() {
    let root = Session::new_root(std::path::PathBuf::from("/proj"), 0);
    let sub = Session::new_sub_session(&root, std::path::PathBuf::from("/proj"), 1);
    assert_eq!(sub.root_session_id, root.id);
    assert_eq!(sub.parent_session_id, Some(root.id));
    assert!(!sub.is_root());
}

#[test]
fn message_log_bounded_at_100_oldest_dropped() {
    let mut session = Session::new_root(std::path::PathBuf::from("/proj"), 0);
    push_n(&mut session, MAX_MESSAGES);
    assert_eq!(session.messages.len(), MAX_MESSAGES);
    assert_eq!(session.messages.front().unwrap().content, "msg-0");

    session.append_message(Message::new(session.id, MessageRole::User, "msg-100", 100), 100);
    assert_eq!(session.messages.len(), MAX_MESSAGES);
    assert_eq!(session.messages.front().unwrap().content, "msg-1");
    assert!(!session.summary.summary.is_empty());
}

#[test]
fn pause_then_resume_round_trips_status() {
    let mut session = Session::new_root(std::path::PathBuf::from("/proj"), 0);
    session.pause(5);
    assert_eq!(session.status, SessionStatus::Paused);
    session.resume(6);
    assert_eq!(session.status, SessionStatus::Active);
}

#[test]
fn session_serde_round_trips() {
    let mut session = Session::new_root(std::path::PathBuf::from("/proj"), 0);
    push_n(&mut session, 3);
    let json = serde_json::to_string(&session).unwrap();
    let back: Session = serde_json::from_str(&json).unwrap();
    assert_eq!(back.messages.len(), 3);
    assert_eq!(back.id, session.id);
}
