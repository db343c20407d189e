// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow state machine and task arena (§3, §4.2).
//!
//! A workflow owns the arena of [`TaskNode`]s it plans and executes; tasks
//! never outlive their workflow and are addressed by [`TaskId`], unique only
//! within that arena. The workflow FSM is:
//!
//! `idle -> semantic_understanding -> routing_decision -> plan_loop`
//! `-> execution -> review -> { replan_evaluation | wait_user_decision }`
//! `-> { execution | paused | completed | failed }`.
//!
//! `paused` is reachable from any non-terminal state (§4.2 "a workflow may be
//! paused at any point before it completes or fails").

use crate::message::MessageId;
use crate::session::SessionId;
use crate::task::{TaskId, TaskNode, TaskState};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

crate::define_id! {
    /// Unique identifier for a workflow.
    pub struct WorkflowId("wfl-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    SemanticUnderstanding,
    RoutingDecision,
    PlanLoop,
    Execution,
    Review,
    ReplanEvaluation,
    WaitUserDecision,
    Paused,
    Completed,
    Failed,
}

crate::simple_display! {
    WorkflowState {
        Idle => "idle",
        SemanticUnderstanding => "semantic_understanding",
        RoutingDecision => "routing_decision",
        PlanLoop => "plan_loop",
        Execution => "execution",
        Review => "review",
        ReplanEvaluation => "replan_evaluation",
        WaitUserDecision => "wait_user_decision",
        Paused => "paused",
        Completed => "completed",
        Failed => "failed",
    }
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Completed | WorkflowState::Failed)
    }

    /// Legal direct transitions per §4.2's Workflow FSM. `Paused` is reachable
    /// from every non-terminal state and resumes back into `Execution`.
    pub fn can_transition_to(&self, next: WorkflowState) -> bool {
        use WorkflowState::*;
        if self.is_terminal() {
            return false;
        }
        if next == Paused && *self != Paused {
            return true;
        }
        matches!(
            (self, next),
            (Idle, SemanticUnderstanding)
                | (SemanticUnderstanding, RoutingDecision)
                | (RoutingDecision, PlanLoop)
                | (PlanLoop, Execution)
                | (PlanLoop, Failed)
                | (Execution, Review)
                | (Execution, Failed)
                | (Review, ReplanEvaluation)
                | (Review, WaitUserDecision)
                | (Review, Completed)
                | (ReplanEvaluation, Execution)
                | (ReplanEvaluation, Failed)
                | (ReplanEvaluation, Completed)
                | (WaitUserDecision, Execution)
                | (WaitUserDecision, Failed)
                | (WaitUserDecision, Completed)
                | (Paused, Execution)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub session_id: SessionId,
    /// Optional grouping identifier for a larger multi-workflow epic (glossary).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<String>,
    pub state: WorkflowState,
    pub user_task: String,
    /// Task arena, insertion-ordered so replan/plan-loop output is deterministic.
    #[serde(default)]
    pub tasks: IndexMap<TaskId, TaskNode>,
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    /// Count of replan cycles entered via `replan_evaluation` (§4.2 convergence).
    #[serde(default)]
    pub replan_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_ask_message_id: Option<MessageId>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Workflow {
    pub fn new(session_id: SessionId, user_task: impl Into<String>, now_ms: u64) -> Self {
        Self {
            id: WorkflowId::new(),
            session_id,
            epic_id: None,
            state: WorkflowState::Idle,
            user_task: user_task.into(),
            tasks: IndexMap::new(),
            context: BTreeMap::new(),
            replan_count: 0,
            pending_ask_message_id: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    #[must_use]
    pub fn transition(&mut self, next: WorkflowState, now_ms: u64) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        self.updated_at_ms = now_ms;
        true
    }

    pub fn add_task(&mut self, task: TaskNode) {
        self.tasks.insert(task.id, task);
    }

    /// Tasks whose `blocked_by` set is fully `done`, and which are themselves
    /// still `created` (§4.2 "a task becomes ready once its dependencies
    /// resolve").
    pub fn ready_tasks(&self) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| {
                t.state == TaskState::Created
                    && t.blocked_by
                        .iter()
                        .all(|dep| self.tasks.get(dep).is_some_and(|d| d.state == TaskState::Done))
            })
            .map(|t| t.id)
            .collect()
    }

    /// Whether every task in the arena has reached a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.values().all(|t| t.state.is_terminal())
    }

    pub fn has_failed_task(&self) -> bool {
        self.tasks.values().any(|t| t.state == TaskState::Blocked)
    }
}

crate::builder! {
    pub struct WorkflowBuilder => Workflow {
        set {
            id: WorkflowId = WorkflowId::new(),
            session_id: SessionId = SessionId::new(),
            state: WorkflowState = WorkflowState::Idle,
            tasks: IndexMap<TaskId, TaskNode> = IndexMap::new(),
            context: BTreeMap<String, serde_json::Value> = BTreeMap::new(),
            replan_count: u32 = 0,
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
        into {
            user_task: String = "do the thing",
        }
        option {
            epic_id: String = None,
            pending_ask_message_id: MessageId = None,
        }
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
