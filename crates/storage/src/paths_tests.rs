// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use weave_core::{CheckpointId, SessionId};

#[test]
fn session_state_path_is_keyed_by_project_and_session() {
    let layout = StateLayout::new("/state");
    let sid = SessionId::new();
    let path = layout.session_state_path("my-project", sid);
    assert_eq!(
        path,
        std::path::Path::new("/state/sessions/my-project").join(sid.to_string()).join("session-state.json")
    );
}

#[test]
fn checkpoint_path_nests_under_session_dir() {
    let layout = StateLayout::new("/state");
    let sid = SessionId::new();
    let cid = CheckpointId::new();
    let path = layout.checkpoint_path("proj", sid, cid);
    assert!(path.starts_with(layout.session_dir("proj", sid)));
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(format!("{cid}.json")).as_deref());
}

#[test]
fn agent_history_path_is_rooted() {
    let layout = StateLayout::new("/state");
    assert_eq!(layout.agent_history_path(), std::path::Path::new("/state/agent-history.json"));
}
