// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory state rebuilt by replaying [`crate::event::SessionEvent`]s
//! (§10.3 "`MaterializedState` rebuilt by replaying the snapshot plus any
//! WAL entries written after it").

use crate::event::SessionEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use weave_core::{prune_oldest, Checkpoint, Session, SessionId};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub sessions: HashMap<SessionId, Session>,
    /// Checkpoints per session, oldest first, pruned to
    /// [`weave_core::MAX_CHECKPOINTS_PER_SESSION`] on every write (§3, §6).
    #[serde(default)]
    pub checkpoints: HashMap<SessionId, Vec<Checkpoint>>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. Every arm is written so applying the same event
    /// twice is a no-op past the first application (§10.3 idempotency).
    pub fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::SessionCreated { session } => {
                self.sessions.entry(session.id).or_insert_with(|| session.clone());
            }
            SessionEvent::SessionMessageAppended { session_id, message, at_ms } => {
                if let Some(session) = self.sessions.get_mut(session_id) {
                    if !session.messages.iter().any(|m| m.id == message.id) {
                        session.append_message(message.clone(), *at_ms);
                    }
                }
            }
            SessionEvent::SessionPaused { session_id, at_ms } => {
                if let Some(session) = self.sessions.get_mut(session_id) {
                    session.pause(*at_ms);
                }
            }
            SessionEvent::SessionResumed { session_id, at_ms } => {
                if let Some(session) = self.sessions.get_mut(session_id) {
                    session.resume(*at_ms);
                }
            }
            SessionEvent::SessionContextSet { session_id, key, value, at_ms } => {
                if let Some(session) = self.sessions.get_mut(session_id) {
                    session.context.insert(key.clone(), value.clone());
                    session.updated_at_ms = *at_ms;
                }
            }
            SessionEvent::WorkflowLinked { session_id, workflow_id, at_ms } => {
                if let Some(session) = self.sessions.get_mut(session_id) {
                    session.active_workflows.insert(*workflow_id);
                    session.updated_at_ms = *at_ms;
                }
            }
            SessionEvent::WorkflowUnlinked { session_id, workflow_id, at_ms } => {
                if let Some(session) = self.sessions.get_mut(session_id) {
                    session.active_workflows.remove(workflow_id);
                    session.updated_at_ms = *at_ms;
                }
            }
            SessionEvent::CheckpointWritten { checkpoint } => {
                let list = self.checkpoints.entry(checkpoint.session_id).or_default();
                if !list.iter().any(|c| c.id == checkpoint.id) {
                    list.push(checkpoint.clone());
                    list.sort_by_key(|c| c.created_at_ms);
                    prune_oldest(list);
                }
            }
        }
    }

    pub fn get_session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn checkpoints_for(&self, id: SessionId) -> &[Checkpoint] {
        self.checkpoints.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
#[path = "../state_tests.rs"]
mod tests;
