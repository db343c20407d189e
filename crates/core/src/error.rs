// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared by every subsystem.
//!
//! Each subsystem (hub, workflow manager, ReACT loop, agent pool, scheduler)
//! owns a `thiserror`-derived enum whose variants map onto the kinds below;
//! [`CoreError`] aggregates them with `#[from]` so call sites propagate with
//! `?` instead of matching and re-wrapping by hand.

use thiserror::Error;

/// Taxonomy of error kinds, independent of which subsystem raised them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Timeout,
    Parse,
    ChildProcess,
    Resource,
    Internal,
}

crate::simple_display! {
    ErrorKind {
        Validation => "validation",
        NotFound => "not_found",
        Conflict => "conflict",
        Timeout => "timeout",
        Parse => "parse",
        ChildProcess => "child_process",
        Resource => "resource",
        Internal => "internal",
    }
}

/// Message Hub errors: routing, mailbox, module registration.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("module already registered: {id}")]
    AlreadyRegistered { id: String },
    #[error("unknown module: {id}")]
    UnknownModule { id: String },
    #[error("blocking send to {target} timed out after {timeout_ms}ms")]
    SendTimeout { target: String, timeout_ms: u64 },
    #[error("handler for {target} failed: {message}")]
    HandlerFailed { target: String, message: String },
    #[error("no route matches message type {message_type}")]
    NoRoute { message_type: String },
}

/// Workflow Manager / FSM errors.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("unknown workflow: {id}")]
    UnknownWorkflow { id: String },
    #[error("unknown task: {id}")]
    UnknownTask { id: String },
    #[error("invalid transition from {from} on workflow {id}")]
    InvalidTransition { id: String, from: String },
    #[error("task graph for workflow {id} contains a cycle")]
    CyclicGraph { id: String },
    #[error("blockedBy references unknown task {task} in workflow {id}")]
    DanglingDependency { id: String, task: String },
    #[error("review loop on workflow {id} exhausted after {max_turns} turns")]
    MaxTurnsReached { id: String, max_turns: u32 },
}

/// ReACT loop errors.
#[derive(Debug, Error)]
pub enum ReactError {
    #[error("planner proposal unrecoverable after {retries} repair attempts: {message}")]
    ProposalError { retries: u32, message: String },
    #[error("proposal missing required field: {field}")]
    MissingField { field: String },
    #[error("unknown action: {action}")]
    UnknownAction { action: String },
    #[error("action {action} missing required param: {param}")]
    MissingParam { action: String, param: String },
}

/// Agent Pool / runtime errors.
#[derive(Debug, Error)]
pub enum AgentPoolError {
    #[error("agent config already registered: {id}")]
    AlreadyRegistered { id: String },
    #[error("unknown agent: {id}")]
    UnknownAgent { id: String },
    #[error("agent {id} is busy")]
    Busy { id: String },
    #[error("dispatch to {id} timed out after {timeout_ms}ms waiting in queue")]
    QueueTimeout { id: String, timeout_ms: u64 },
    #[error("failed to spawn agent {id}: {message}")]
    SpawnFailed { id: String, message: String },
    #[error("agent {id} exceeded max restarts ({max_restarts})")]
    MaxRestartsExceeded { id: String, max_restarts: u32 },
}

/// Concurrency Scheduler / Resource Pool errors.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("insufficient resources for requirement {requirement}")]
    InsufficientResources { requirement: String },
    #[error("scheduler is degraded and pausing new dispatches")]
    Degraded,
    #[error("concurrency cap reached: {active}/{max}")]
    ConcurrencyCapped { active: u32, max: u32 },
    #[error("unknown task in scheduler: {id}")]
    UnknownTask { id: String },
}

/// Top-level error aggregating every subsystem error by `#[from]`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Hub(#[from] HubError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    React(#[from] ReactError),
    #[error(transparent)]
    AgentPool(#[from] AgentPoolError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("invariant violated: {context}")]
    Internal { context: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Hub(HubError::AlreadyRegistered { .. }) => ErrorKind::Conflict,
            CoreError::Hub(HubError::UnknownModule { .. }) => ErrorKind::NotFound,
            CoreError::Hub(HubError::SendTimeout { .. }) => ErrorKind::Timeout,
            CoreError::Hub(HubError::HandlerFailed { .. }) => ErrorKind::Internal,
            CoreError::Hub(HubError::NoRoute { .. }) => ErrorKind::NotFound,
            CoreError::Workflow(WorkflowError::UnknownWorkflow { .. })
            | CoreError::Workflow(WorkflowError::UnknownTask { .. }) => ErrorKind::NotFound,
            CoreError::Workflow(WorkflowError::InvalidTransition { .. }) => ErrorKind::Conflict,
            CoreError::Workflow(WorkflowError::CyclicGraph { .. })
            | CoreError::Workflow(WorkflowError::DanglingDependency { .. }) => {
                ErrorKind::Validation
            }
            CoreError::Workflow(WorkflowError::MaxTurnsReached { .. }) => ErrorKind::Internal,
            CoreError::React(ReactError::ProposalError { .. }) => ErrorKind::Parse,
            CoreError::React(ReactError::MissingField { .. })
            | CoreError::React(ReactError::UnknownAction { .. })
            | CoreError::React(ReactError::MissingParam { .. }) => ErrorKind::Validation,
            CoreError::AgentPool(AgentPoolError::AlreadyRegistered { .. }) => ErrorKind::Conflict,
            CoreError::AgentPool(AgentPoolError::UnknownAgent { .. }) => ErrorKind::NotFound,
            CoreError::AgentPool(AgentPoolError::Busy { .. }) => ErrorKind::Conflict,
            CoreError::AgentPool(AgentPoolError::QueueTimeout { .. }) => ErrorKind::Timeout,
            CoreError::AgentPool(AgentPoolError::SpawnFailed { .. }) => ErrorKind::ChildProcess,
            CoreError::AgentPool(AgentPoolError::MaxRestartsExceeded { .. }) => {
                ErrorKind::ChildProcess
            }
            CoreError::Scheduler(SchedulerError::InsufficientResources { .. }) => {
                ErrorKind::Resource
            }
            CoreError::Scheduler(SchedulerError::Degraded) => ErrorKind::Resource,
            CoreError::Scheduler(SchedulerError::ConcurrencyCapped { .. }) => ErrorKind::Resource,
            CoreError::Scheduler(SchedulerError::UnknownTask { .. }) => ErrorKind::NotFound,
            CoreError::Internal { .. } => ErrorKind::Internal,
            CoreError::Io(_) => ErrorKind::Internal,
            CoreError::Serde(_) => ErrorKind::Parse,
        }
    }
}

/// The user-visible error envelope described in §7: every error carries
/// `{kind, message, details?}` so terminal workflow states can persist and
/// resume re-reads the same error.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorEnvelope {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&CoreError> for ErrorEnvelope {
    fn from(err: &CoreError) -> Self {
        Self { kind: err.kind().to_string(), message: err.to_string(), details: None }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
