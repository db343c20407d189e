// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast channel for the outbound events described across the runtime
//! (`messageUpdate`, `workflow_update`, `agent_update`, `session_paused`,
//! `session_resumed` — §4.1, §4.2, §4.4, §5). `weave-daemon` subscribes and
//! forwards these over whatever transport it wires up; this crate has no
//! opinion on delivery.

use tokio::sync::broadcast;
use weave_core::{
    AgentInstanceId, AgentInstanceState, MailboxEntryId, MailboxStatus, SessionId, TaskId,
    TaskState, WorkflowId, WorkflowState,
};

/// Default broadcast channel capacity; slow subscribers lag rather than block publishers.
pub const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub enum OutboundEvent {
    MessageUpdate {
        id: MailboxEntryId,
        status: MailboxStatus,
        result: Option<serde_json::Value>,
        error: Option<String>,
    },
    WorkflowUpdate {
        id: WorkflowId,
        state: WorkflowState,
    },
    TaskUpdate {
        workflow_id: WorkflowId,
        task_id: TaskId,
        state: TaskState,
    },
    AgentUpdate {
        id: AgentInstanceId,
        state: AgentInstanceState,
    },
    SessionPaused {
        id: SessionId,
        reason: String,
    },
    SessionResumed {
        id: SessionId,
    },
}

/// A cheaply-cloneable handle onto a shared broadcast channel. All clones
/// share the same underlying sender, so subscribers see every publisher's events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<OutboundEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutboundEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Returns the number of live subscribers that
    /// received it; `0` just means nobody's currently listening, not an error.
    pub fn publish(&self, event: OutboundEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
