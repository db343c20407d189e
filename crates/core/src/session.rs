// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session: long-lived conversation state (§3).
//!
//! Sessions form a tree (`root_session_id`, `parent_session_id`) so that a
//! dispatched agent can own a nested sub-session (§4.4 "Session binding &
//! dispatch"). The message log is bounded at [`MAX_MESSAGES`]; the oldest
//! entry is dropped on overflow and folded into `summary`.

use crate::message::Message;
use crate::workflow::WorkflowId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};

crate::define_id! {
    /// Unique identifier for a session.
    pub struct SessionId("ses-");
}

/// Bound on the in-memory message log (§3, §8 boundary behavior).
pub const MAX_MESSAGES: usize = 100;

/// Default ledger focus window applied before prompt rendering (glossary).
pub const DEFAULT_LEDGER_FOCUS: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Paused,
}

crate::simple_display! {
    SessionStatus {
        Active => "active",
        Paused => "paused",
    }
}

/// A compressible summary of messages evicted from the bounded log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Rolling prose summary of everything evicted so far.
    #[serde(default)]
    pub summary: String,
    /// The most recent messages retained verbatim alongside the summary.
    #[serde(default)]
    pub retained_tail: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub project_path: std::path::PathBuf,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    pub last_accessed_at_ms: u64,
    pub status: SessionStatus,
    #[serde(default)]
    pub messages: VecDeque<Message>,
    #[serde(default)]
    pub summary: SessionSummary,
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub active_workflows: HashSet<WorkflowId>,
    /// Root of the session tree; equal to `id` for a top-level session.
    pub root_session_id: SessionId,
    /// Set when this session is a nested sub-session owned by a dispatched agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_session_id: Option<SessionId>,
}

impl Session {
    pub fn new_root(project_path: std::path::PathBuf, now_ms: u64) -> Self {
        let id = SessionId::new();
        Self {
            id,
            project_path,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            last_accessed_at_ms: now_ms,
            status: SessionStatus::Active,
            messages: VecDeque::new(),
            summary: SessionSummary::default(),
            context: BTreeMap::new(),
            active_workflows: HashSet::new(),
            root_session_id: id,
            parent_session_id: None,
        }
    }

    /// Create a nested sub-session owned by a dispatching agent's target.
    pub fn new_sub_session(
        parent: &Session,
        project_path: std::path::PathBuf,
        now_ms: u64,
    ) -> Self {
        let id = SessionId::new();
        Self {
            id,
            project_path,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            last_accessed_at_ms: now_ms,
            status: SessionStatus::Active,
            messages: VecDeque::new(),
            summary: SessionSummary::default(),
            context: BTreeMap::new(),
            active_workflows: HashSet::new(),
            root_session_id: parent.root_session_id,
            parent_session_id: Some(parent.id),
        }
    }

    /// Append a message, preserving total order and the 100-message bound.
    /// Messages must already be non-decreasing in timestamp (§5 Ordering);
    /// callers that violate this are an `InternalError` at a higher layer.
    pub fn append_message(&mut self, message: Message, now_ms: u64) {
        if self.messages.len() >= MAX_MESSAGES {
            if let Some(evicted) = self.messages.pop_front() {
                self.fold_into_summary(evicted);
            }
        }
        self.messages.push_back(message);
        self.updated_at_ms = now_ms;
        self.last_accessed_at_ms = now_ms;
    }

    fn fold_into_summary(&mut self, evicted: Message) {
        if self.summary.summary.is_empty() {
            self.summary.summary = format!("{}: {}", evicted.role, evicted.content);
        } else {
            self.summary.summary.push_str(" | ");
            self.summary.summary.push_str(&format!("{}: {}", evicted.role, evicted.content));
        }
    }

    pub fn pause(&mut self, now_ms: u64) {
        self.status = SessionStatus::Paused;
        self.updated_at_ms = now_ms;
    }

    pub fn resume(&mut self, now_ms: u64) {
        self.status = SessionStatus::Active;
        self.updated_at_ms = now_ms;
    }

    pub fn is_root(&self) -> bool {
        self.parent_session_id.is_none()
    }
}

crate::builder! {
    pub struct SessionBuilder => Session {
        set {
            id: SessionId = SessionId::new(),
            project_path: std::path::PathBuf = std::path::PathBuf::new(),
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
            last_accessed_at_ms: u64 = 0,
            status: SessionStatus = SessionStatus::Active,
            messages: VecDeque<Message> = VecDeque::new(),
            summary: SessionSummary = SessionSummary::default(),
            context: BTreeMap<String, serde_json::Value> = BTreeMap::new(),
            active_workflows: HashSet<WorkflowId> = HashSet::new(),
            root_session_id: SessionId = SessionId::new(),
        }
        option {
            parent_session_id: SessionId = None,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
