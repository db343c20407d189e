// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint snapshots of a workflow's materialized state (§3, §4.2, §10.2).
//!
//! Checkpoints let a workflow roll back to a known-good point after a failed
//! replan. Storage retains only the newest 10 per session; older ones are
//! pruned on write. A checkpoint holds ids and a phase history only — it
//! re-resolves tasks through the owning workflow's arena rather than holding
//! a redundant copy (§4.2 "avoid cyclic workflow <-> task <-> checkpoint
//! references").

use crate::agent_instance::AgentInstanceId;
use crate::session::SessionId;
use crate::task::TaskId;
use crate::workflow::{Workflow, WorkflowId, WorkflowState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// Unique identifier for a workflow checkpoint.
    pub struct CheckpointId("chk-");
}

/// Checkpoints retained per session before the oldest is pruned (§10.2).
pub const MAX_CHECKPOINTS_PER_SESSION: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskProgress {
    pub completed_task_ids: Vec<TaskId>,
    pub failed_task_ids: Vec<TaskId>,
    pub pending_task_ids: Vec<TaskId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: CheckpointId,
    pub session_id: SessionId,
    pub workflow_id: WorkflowId,
    pub original_task: String,
    pub task_progress: TaskProgress,
    /// Per-agent opaque state captured at checkpoint time, keyed by instance id.
    #[serde(default)]
    pub agent_state: HashMap<AgentInstanceId, serde_json::Value>,
    /// Workflow FSM states visited up to and including this checkpoint.
    pub phase_history: Vec<WorkflowState>,
    pub created_at_ms: u64,
}

impl Checkpoint {
    pub fn capture(workflow: &Workflow, phase_history: Vec<WorkflowState>, now_ms: u64) -> Self {
        use crate::task::TaskState;

        let mut progress = TaskProgress::default();
        for task in workflow.tasks.values() {
            match task.state {
                TaskState::Done => progress.completed_task_ids.push(task.id),
                TaskState::Blocked => progress.failed_task_ids.push(task.id),
                _ => progress.pending_task_ids.push(task.id),
            }
        }

        Self {
            id: CheckpointId::new(),
            session_id: workflow.session_id,
            workflow_id: workflow.id,
            original_task: workflow.user_task.clone(),
            task_progress: progress,
            agent_state: HashMap::new(),
            phase_history,
            created_at_ms: now_ms,
        }
    }
}

/// Drop the oldest entries from `checkpoints` (assumed ascending by creation
/// time) until at most [`MAX_CHECKPOINTS_PER_SESSION`] remain.
pub fn prune_oldest(checkpoints: &mut Vec<Checkpoint>) {
    if checkpoints.len() > MAX_CHECKPOINTS_PER_SESSION {
        let excess = checkpoints.len() - MAX_CHECKPOINTS_PER_SESSION;
        checkpoints.drain(0..excess);
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
