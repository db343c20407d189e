// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events that mutate durable session/checkpoint state (§10.3).
//!
//! Each variant is the smallest fact that can be applied idempotently —
//! applying the same event twice must leave the same state as applying it
//! once, since WAL replay after a crash may re-apply an event that was
//! already visible before the crash (§10.3 "replay the log").

use serde::{Deserialize, Serialize};
use weave_core::{Checkpoint, Message, Session, SessionId, WorkflowId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A new root or sub-session was created. Idempotent: applying twice
    /// just re-inserts the same session.
    SessionCreated { session: Session },
    /// A message was appended (or, on an already-full log, evicted the
    /// oldest into the rolling summary — see `Session::append_message`).
    SessionMessageAppended { session_id: SessionId, message: Message, at_ms: u64 },
    SessionPaused { session_id: SessionId, at_ms: u64 },
    SessionResumed { session_id: SessionId, at_ms: u64 },
    SessionContextSet { session_id: SessionId, key: String, value: serde_json::Value, at_ms: u64 },
    WorkflowLinked { session_id: SessionId, workflow_id: WorkflowId, at_ms: u64 },
    WorkflowUnlinked { session_id: SessionId, workflow_id: WorkflowId, at_ms: u64 },
    /// A workflow checkpoint was captured. Pruning to the newest 10 (§3, §6)
    /// happens in [`crate::state::MaterializedState::apply`], not here, so
    /// replay reconstructs the same prune decisions deterministically.
    CheckpointWritten { checkpoint: Checkpoint },
}

impl SessionEvent {
    /// The session this event concerns, for per-session lock routing.
    pub fn session_id(&self) -> SessionId {
        match self {
            SessionEvent::SessionCreated { session } => session.id,
            SessionEvent::SessionMessageAppended { session_id, .. }
            | SessionEvent::SessionPaused { session_id, .. }
            | SessionEvent::SessionResumed { session_id, .. }
            | SessionEvent::SessionContextSet { session_id, .. }
            | SessionEvent::WorkflowLinked { session_id, .. }
            | SessionEvent::WorkflowUnlinked { session_id, .. } => *session_id,
            SessionEvent::CheckpointWritten { checkpoint } => checkpoint.session_id,
        }
    }
}
