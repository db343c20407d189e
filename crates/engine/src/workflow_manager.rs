// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow Manager (§4.2): owns workflow/task lifecycle, drives the
//! post-task review loop, and applies the execution-nudge heuristic. The FSM
//! legality itself lives on [`weave_core::Workflow`]/[`weave_core::TaskNode`]
//! — this module is the stateful driver sitting on top of it.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use weave_core::{Clock, TaskId, TaskNode, TaskState, Workflow, WorkflowError, WorkflowId, WorkflowState};

use crate::event_bus::{EventBus, OutboundEvent};

/// Output of one main-thread turn, fed to the reviewer as evidence.
pub struct TurnResult {
    pub output: String,
    pub tool_trace: Vec<String>,
}

#[async_trait]
pub trait MainTurnRunner: Send + Sync {
    async fn run_turn(&self, input: &str) -> Result<TurnResult, String>;
}

/// A parsed reviewer verdict (§4.2 review loop step 2): tolerant of a
/// markdown-wrapped JSON object, extracted via [`extract_json_object`].
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ReviewVerdict {
    pub passed: bool,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub blockers: Vec<String>,
    #[serde(default)]
    pub evidence: Option<String>,
}

#[async_trait]
pub trait WorkflowReviewer: Send + Sync {
    /// Run with a readonly tool subset in an isolated context; `evidence` is
    /// the assistant's raw output, never the session ledger.
    async fn review(&self, evidence: &str) -> Result<String, String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStopReason {
    Passed,
    MaxTurnsReached,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ReviewOutcome {
    pub passed: bool,
    pub turns: u32,
    pub stop_reason: ReviewStopReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_feedback: Option<String>,
}

pub const DEFAULT_MAX_REVIEW_TURNS: u32 = 10;

/// Extract the outermost `{...}` JSON object from text and parse it as `T`
/// (§4.2 "tolerate a markdown-wrapped JSON object").
pub fn extract_json_object<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, String> {
    let start = text.find('{').ok_or_else(|| "no JSON object found in reviewer output".to_string())?;
    let mut depth = 0i32;
    let mut end = None;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + offset + 1);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end.ok_or_else(|| "unterminated JSON object in reviewer output".to_string())?;
    serde_json::from_str(&text[start..end]).map_err(|e| e.to_string())
}

/// Keywords that mark a user input as execution-oriented (§4.2 execution-nudge policy).
const EXECUTION_KEYWORDS: &[&str] = &["modify", "run", "test", "fix", "implement", "edit", "search"];
/// Keywords in a reply that count as evidence the work actually happened.
const EVIDENCE_KEYWORDS: &[&str] = &["ran ", "executed", "output:", "result:", "wrote ", "created "];

/// Whether a main-thread turn should be nudged to re-run with a
/// SYSTEM-CONTINUATION instruction (§4.2): the user's ask looked
/// execution-oriented, no tool trace was recorded, the reply reads as a
/// promise rather than a report, and the nudge hasn't already fired this turn.
pub fn needs_execution_nudge(user_input: &str, reply: &TurnResult, nudge_already_applied: bool) -> bool {
    if nudge_already_applied {
        return false;
    }
    let input_lower = user_input.to_lowercase();
    let looks_execution_oriented = EXECUTION_KEYWORDS.iter().any(|k| input_lower.contains(k));
    if !looks_execution_oriented {
        return false;
    }
    if !reply.tool_trace.is_empty() {
        return false;
    }
    let reply_lower = reply.output.to_lowercase();
    !EVIDENCE_KEYWORDS.iter().any(|k| reply_lower.contains(k))
}

struct State {
    workflows: HashMap<WorkflowId, Workflow>,
}

/// Owns the workflow/task arena (§3 Ownership) and drives its FSM.
pub struct WorkflowManager<C: Clock> {
    clock: C,
    state: Mutex<State>,
    events: EventBus,
}

impl<C: Clock> WorkflowManager<C> {
    pub fn new(clock: C, events: EventBus) -> Self {
        Self { clock, events, state: Mutex::new(State { workflows: HashMap::new() }) }
    }

    pub fn create(&self, session_id: weave_core::SessionId, user_task: impl Into<String>) -> WorkflowId {
        let workflow = Workflow::new(session_id, user_task, self.clock.epoch_ms());
        let id = workflow.id;
        self.state.lock().workflows.insert(id, workflow);
        self.broadcast(id, WorkflowState::Idle);
        id
    }

    pub fn get(&self, id: WorkflowId) -> Option<Workflow> {
        self.state.lock().workflows.get(&id).cloned()
    }

    pub fn transition(&self, id: WorkflowId, next: WorkflowState) -> Result<(), WorkflowError> {
        let mut state = self.state.lock();
        let workflow = state.workflows.get_mut(&id).ok_or_else(|| WorkflowError::UnknownWorkflow { id: id.to_string() })?;
        let from = workflow.state;
        if !workflow.transition(next, self.clock.epoch_ms()) {
            return Err(WorkflowError::InvalidTransition { id: id.to_string(), from: from.to_string() });
        }
        drop(state);
        self.broadcast(id, next);
        Ok(())
    }

    /// `paused` is reachable from any non-terminal state (§4.2).
    pub fn pause(&self, id: WorkflowId) -> Result<(), WorkflowError> {
        self.transition(id, WorkflowState::Paused)
    }

    pub fn resume(&self, id: WorkflowId) -> Result<(), WorkflowError> {
        self.transition(id, WorkflowState::Execution)
    }

    pub fn add_task(&self, workflow_id: WorkflowId, task: TaskNode) -> Result<TaskId, WorkflowError> {
        let mut state = self.state.lock();
        let workflow = state.workflows.get_mut(&workflow_id).ok_or_else(|| WorkflowError::UnknownWorkflow { id: workflow_id.to_string() })?;
        for dep in &task.blocked_by {
            if !workflow.tasks.contains_key(dep) {
                return Err(WorkflowError::DanglingDependency { id: workflow_id.to_string(), task: dep.to_string() });
            }
        }
        let id = task.id;
        workflow.add_task(task);
        Ok(id)
    }

    pub fn ready_tasks(&self, workflow_id: WorkflowId) -> Result<Vec<TaskId>, WorkflowError> {
        let state = self.state.lock();
        let workflow = state.workflows.get(&workflow_id).ok_or_else(|| WorkflowError::UnknownWorkflow { id: workflow_id.to_string() })?;
        Ok(workflow.ready_tasks())
    }

    pub fn transition_task(&self, workflow_id: WorkflowId, task_id: TaskId, next: TaskState) -> Result<(), WorkflowError> {
        let mut state = self.state.lock();
        let workflow = state.workflows.get_mut(&workflow_id).ok_or_else(|| WorkflowError::UnknownWorkflow { id: workflow_id.to_string() })?;
        let now = self.clock.epoch_ms();
        let task = workflow.tasks.get_mut(&task_id).ok_or_else(|| WorkflowError::UnknownTask { id: task_id.to_string() })?;
        let from = task.state;
        if !task.transition(next, now) {
            return Err(WorkflowError::InvalidTransition { id: task_id.to_string(), from: from.to_string() });
        }
        let wfl_id = workflow.id;
        drop(state);
        self.events.publish(OutboundEvent::TaskUpdate { workflow_id: wfl_id, task_id, state: next });
        Ok(())
    }

    /// Drive the post-task review loop (§4.2): rerun the main turn with
    /// reviewer feedback folded in until `passed` or `max_turns` is exhausted.
    pub async fn run_review_loop(
        &self,
        runner: &dyn MainTurnRunner,
        reviewer: &dyn WorkflowReviewer,
        initial_input: &str,
        max_turns: u32,
    ) -> ReviewOutcome {
        let mut input = initial_input.to_string();
        for turn in 1..=max_turns {
            let result = match runner.run_turn(&input).await {
                Ok(result) => result,
                Err(message) => {
                    return ReviewOutcome { passed: false, turns: turn, stop_reason: ReviewStopReason::MaxTurnsReached, final_feedback: Some(message) };
                }
            };
            let raw_verdict = match reviewer.review(&result.output).await {
                Ok(raw) => raw,
                Err(message) => {
                    return ReviewOutcome { passed: false, turns: turn, stop_reason: ReviewStopReason::MaxTurnsReached, final_feedback: Some(message) };
                }
            };
            let verdict: ReviewVerdict = match extract_json_object(&raw_verdict) {
                Ok(verdict) => verdict,
                Err(message) => {
                    return ReviewOutcome { passed: false, turns: turn, stop_reason: ReviewStopReason::MaxTurnsReached, final_feedback: Some(message) };
                }
            };
            if verdict.passed {
                return ReviewOutcome { passed: true, turns: turn, stop_reason: ReviewStopReason::Passed, final_feedback: None };
            }
            input = format!("{initial_input}\n\nReviewer feedback: {}", verdict.feedback);
        }
        ReviewOutcome {
            passed: false,
            turns: max_turns,
            stop_reason: ReviewStopReason::MaxTurnsReached,
            final_feedback: Some("review loop exhausted max turns".to_string()),
        }
    }

    fn broadcast(&self, id: WorkflowId, state: WorkflowState) {
        self.events.publish(OutboundEvent::WorkflowUpdate { id, state });
    }
}

#[cfg(test)]
#[path = "workflow_manager_tests.rs"]
mod tests;
