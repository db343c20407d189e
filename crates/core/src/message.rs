// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message types routed through the Message Hub (§3, §4.1).

use crate::session::SessionId;
use crate::task::TaskId;
use crate::workflow::WorkflowId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a message. Carries a monotone counter suffix
    /// so that two messages created within the same millisecond still sort
    /// total-order within a session (§5 "Ordering").
    pub struct MessageId("msg-");
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Orchestrator,
}

crate::simple_display! {
    MessageRole {
        User => "user",
        Assistant => "assistant",
        System => "system",
        Orchestrator => "orchestrator",
    }
}

/// An attachment reference carried alongside message content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub uri: String,
}

/// A single message appended to a session's log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub session_id: SessionId,
    pub role: MessageRole,
    pub content: String,
    /// Epoch milliseconds; combined with the id's monotone suffix to break
    /// same-millisecond ties (§5 Ordering).
    pub timestamp_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
}

impl Message {
    pub fn new(session_id: SessionId, role: MessageRole, content: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            id: MessageId::new(),
            session_id,
            role,
            content: content.into(),
            timestamp_ms,
            attachments: Vec::new(),
            workflow_id: None,
            task_id: None,
        }
    }
}

crate::builder! {
    pub struct MessageBuilder => Message {
        set {
            id: MessageId = MessageId::new(),
            session_id: SessionId = SessionId::new(),
            role: MessageRole = MessageRole::User,
            timestamp_ms: u64 = 1_000_000,
            attachments: Vec<Attachment> = Vec::new(),
        }
        into {
            content: String = "hello",
        }
        option {
            workflow_id: WorkflowId = None,
            task_id: TaskId = None,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
