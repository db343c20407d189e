// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending user-input requests ("asks") raised by a workflow or agent (§4.2,
//! §6 `workflow.input`).
//!
//! `workflow.input(workflowId, input)` routes to the oldest pending ask whose
//! scope matches, if one exists; otherwise the input is enqueued as a runtime
//! instruction for later consumption (§4.3 "pending runtime instructions").

use crate::agent_instance::AgentInstanceId;
use crate::session::SessionId;
use crate::workflow::WorkflowId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a pending ask, exposed externally as `requestId`.
    pub struct AskId("ask-");
}

/// The scope an ask (or a runtime instruction) is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AskScope {
    Agent(AgentInstanceId),
    Workflow(WorkflowId),
    Epic(String),
    Session(SessionId),
}

impl AskScope {
    pub fn matches_workflow(&self, workflow_id: WorkflowId) -> bool {
        matches!(self, AskScope::Workflow(id) if *id == workflow_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ask {
    pub id: AskId,
    pub scope: AskScope,
    pub prompt: String,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl Ask {
    pub fn new(scope: AskScope, prompt: impl Into<String>, now_ms: u64) -> Self {
        Self { id: AskId::new(), scope, prompt: prompt.into(), created_at_ms: now_ms, resolution: None }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    pub fn resolve(&mut self, input: impl Into<String>) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.resolution = Some(input.into());
        true
    }
}

/// A runtime instruction enqueued when no pending ask matched the scope at
/// delivery time (§4.3). Consumed exactly once by the next planner round for
/// that scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeInstruction {
    pub scope: AskScope,
    pub instruction: String,
    pub created_at_ms: u64,
}

/// Find the oldest unresolved ask for `workflow_id` (`asks` is assumed
/// ascending by creation order), per §6's `workflow.input` routing rule.
pub fn oldest_pending_ask_for_workflow(asks: &[Ask], workflow_id: WorkflowId) -> Option<usize> {
    asks.iter().position(|a| !a.is_resolved() && a.scope.matches_workflow(workflow_id))
}

#[cfg(test)]
#[path = "ask_tests.rs"]
mod tests;
