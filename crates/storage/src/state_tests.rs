// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use weave_core::{Message, MessageRole, Session};

fn root_session() -> Session {
    Session::new_root(std::path::PathBuf::from("/proj"), 1_000)
}

#[test]
fn session_created_is_idempotent() {
    let session = root_session();
    let event = SessionEvent::SessionCreated { session: session.clone() };
    let mut state = MaterializedState::new();
    state.apply(&event);
    state.apply(&event);
    assert_eq!(state.sessions.len(), 1);
    assert_eq!(state.get_session(session.id).unwrap().id, session.id);
}

#[test]
fn message_appended_twice_with_same_id_is_not_duplicated() {
    let session = root_session();
    let mut state = MaterializedState::new();
    state.apply(&SessionEvent::SessionCreated { session: session.clone() });

    let message = Message::builder().session_id(session.id).role(MessageRole::User).content("hi").build();
    let event = SessionEvent::SessionMessageAppended { session_id: session.id, message, at_ms: 2_000 };
    state.apply(&event);
    state.apply(&event);

    assert_eq!(state.get_session(session.id).unwrap().messages.len(), 1);
}

#[test]
fn pause_and_resume_update_status() {
    let session = root_session();
    let mut state = MaterializedState::new();
    state.apply(&SessionEvent::SessionCreated { session: session.clone() });
    state.apply(&SessionEvent::SessionPaused { session_id: session.id, at_ms: 2_000 });
    assert_eq!(state.get_session(session.id).unwrap().status, weave_core::SessionStatus::Paused);
    state.apply(&SessionEvent::SessionResumed { session_id: session.id, at_ms: 3_000 });
    assert_eq!(state.get_session(session.id).unwrap().status, weave_core::SessionStatus::Active);
}

#[test]
fn checkpoints_are_pruned_to_max_retained() {
    let session = root_session();
    let mut state = MaterializedState::new();
    state.apply(&SessionEvent::SessionCreated { session: session.clone() });

    let workflow = weave_core::Workflow::builder().session_id(session.id).build();
    for i in 0..15u64 {
        let checkpoint = weave_core::Checkpoint::capture(&workflow, vec![], 1_000 + i);
        state.apply(&SessionEvent::CheckpointWritten { checkpoint });
    }

    assert_eq!(state.checkpoints_for(session.id).len(), weave_core::MAX_CHECKPOINTS_PER_SESSION);
}

#[test]
fn workflow_link_and_unlink_round_trip() {
    let session = root_session();
    let mut state = MaterializedState::new();
    state.apply(&SessionEvent::SessionCreated { session: session.clone() });

    let workflow_id = weave_core::WorkflowId::new();
    state.apply(&SessionEvent::WorkflowLinked { session_id: session.id, workflow_id, at_ms: 2_000 });
    assert!(state.get_session(session.id).unwrap().active_workflows.contains(&workflow_id));

    state.apply(&SessionEvent::WorkflowUnlinked { session_id: session.id, workflow_id, at_ms: 3_000 });
    assert!(!state.get_session(session.id).unwrap().active_workflows.contains(&workflow_id));
}
