// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task (TaskNode) state machine (§3, §4.2).
//!
//! `created -> ready` (once every `blocked_by` task is `done`)
//! `-> dispatching -> dispatched -> running`
//! `-> { execution_succeeded -> reviewing -> done }`
//! `| execution_failed -> { rework_required -> ready | blocked }`.

use crate::agent_instance::AgentInstanceId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a task, unique within its owning workflow.
    pub struct TaskId("tsk-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Created,
    Ready,
    Dispatching,
    Dispatched,
    Running,
    ExecutionSucceeded,
    Reviewing,
    Done,
    ExecutionFailed,
    ReworkRequired,
    Blocked,
}

crate::simple_display! {
    TaskState {
        Created => "created",
        Ready => "ready",
        Dispatching => "dispatching",
        Dispatched => "dispatched",
        Running => "running",
        ExecutionSucceeded => "execution_succeeded",
        Reviewing => "reviewing",
        Done => "done",
        ExecutionFailed => "execution_failed",
        ReworkRequired => "rework_required",
        Blocked => "blocked",
    }
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Done | TaskState::Blocked)
    }

    /// Legal direct transitions per §4.2's Task FSM.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Created, Ready)
                | (Ready, Dispatching)
                | (Dispatching, Dispatched)
                | (Dispatched, Running)
                | (Running, ExecutionSucceeded)
                | (Running, ExecutionFailed)
                | (ExecutionSucceeded, Reviewing)
                | (Reviewing, Done)
                | (Reviewing, ReworkRequired)
                | (ExecutionFailed, ReworkRequired)
                | (ExecutionFailed, Blocked)
                | (ReworkRequired, Ready)
                | (ReworkRequired, Blocked)
        )
    }
}

/// Outcome of a finished task, recorded once the task reaches `done` or `blocked`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: TaskId,
    pub description: String,
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_agent_id: Option<AgentInstanceId>,
    #[serde(default)]
    pub blocked_by: Vec<TaskId>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(default)]
    pub iteration_count: u32,
    pub max_iterations: u32,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default)]
    pub context_isolation_required: bool,
}

impl TaskNode {
    pub fn new(id: TaskId, description: impl Into<String>, max_iterations: u32, now_ms: u64) -> Self {
        Self {
            id,
            description: description.into(),
            state: TaskState::Created,
            assignee_agent_id: None,
            blocked_by: Vec::new(),
            tools: Vec::new(),
            result: None,
            iteration_count: 0,
            max_iterations,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            context_isolation_required: false,
        }
    }

    #[must_use]
    pub fn transition(&mut self, next: TaskState, now_ms: u64) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        self.updated_at_ms = now_ms;
        true
    }
}

crate::builder! {
    pub struct TaskNodeBuilder => TaskNode {
        set {
            id: TaskId = TaskId::new(),
            state: TaskState = TaskState::Created,
            blocked_by: Vec<TaskId> = Vec::new(),
            tools: Vec<String> = Vec::new(),
            iteration_count: u32 = 0,
            max_iterations: u32 = 10,
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
            context_isolation_required: bool = false,
        }
        into {
            description: String = "do the thing",
        }
        option {
            assignee_agent_id: AgentInstanceId = None,
            result: TaskResult = None,
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
