// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use weave_core::{Message, MessageRole, Session};

fn open(dir: &tempfile::TempDir) -> SessionStore {
    SessionStore::open(dir.path()).expect("open store")
}

#[test]
fn create_and_read_back_a_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open(&dir);
    let session = Session::new_root(std::path::PathBuf::from("/proj"), 1_000);
    store.create_session(session.clone()).expect("create");

    let loaded = store.get_session(session.id).expect("loaded");
    assert_eq!(loaded.id, session.id);
}

#[test]
fn append_message_is_reflected_immediately() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open(&dir);
    let session = Session::new_root(std::path::PathBuf::from("/proj"), 1_000);
    store.create_session(session.clone()).expect("create");

    let message =
        Message::builder().session_id(session.id).role(MessageRole::User).content("hi").build();
    store.append_message(session.id, message, 2_000).expect("append");

    assert_eq!(store.get_session(session.id).unwrap().messages.len(), 1);
}

#[test]
fn restart_replays_wal_into_identical_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = Session::new_root(std::path::PathBuf::from("/proj"), 1_000);
    {
        let store = open(&dir);
        store.create_session(session.clone()).expect("create");
        let message =
            Message::builder().session_id(session.id).role(MessageRole::User).content("hi").build();
        store.append_message(session.id, message, 2_000).expect("append");
        store.pause(session.id, 3_000).expect("pause");
    }

    let reopened = open(&dir);
    let loaded = reopened.get_session(session.id).expect("loaded");
    assert_eq!(loaded.messages.len(), 1);
    assert_eq!(loaded.status, weave_core::SessionStatus::Paused);
}

#[test]
fn compact_then_restart_still_recovers_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = Session::new_root(std::path::PathBuf::from("/proj"), 1_000);
    {
        let store = open(&dir);
        store.create_session(session.clone()).expect("create");
        store.compact().expect("compact");
        store.resume(session.id, 2_000).expect("resume after snapshot");
    }

    let reopened = open(&dir);
    let loaded = reopened.get_session(session.id).expect("loaded");
    assert_eq!(loaded.status, weave_core::SessionStatus::Active);
}

#[test]
fn write_checkpoint_persists_standalone_file_and_cache() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open(&dir);
    let session = Session::new_root(std::path::PathBuf::from("/proj"), 1_000);
    store.create_session(session.clone()).expect("create");

    let workflow = weave_core::Workflow::builder().session_id(session.id).build();
    let checkpoint = weave_core::Checkpoint::capture(&workflow, vec![], 2_000);
    let checkpoint_id = checkpoint.id;
    store.write_checkpoint("proj", checkpoint).expect("write checkpoint");

    assert_eq!(store.checkpoints_for(session.id).len(), 1);
    let path = store.layout().checkpoint_path("proj", session.id, checkpoint_id);
    assert!(path.exists());
}

#[test]
fn unknown_session_lookup_returns_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open(&dir);
    assert!(store.get_session(weave_core::SessionId::new()).is_none());
}
