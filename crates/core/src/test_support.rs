// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::mailbox::MailboxStatus;
use crate::task::TaskState;
use crate::workflow::WorkflowState;

/// Proptest strategies for core state machine types, used by property tests
/// in `weave-engine` (FSM invariants, §8) that need to sample arbitrary
/// states rather than enumerate every transition by hand.
pub mod strategies {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_workflow_state() -> impl Strategy<Value = WorkflowState> {
        prop_oneof![
            Just(WorkflowState::Idle),
            Just(WorkflowState::SemanticUnderstanding),
            Just(WorkflowState::RoutingDecision),
            Just(WorkflowState::PlanLoop),
            Just(WorkflowState::Execution),
            Just(WorkflowState::Review),
            Just(WorkflowState::ReplanEvaluation),
            Just(WorkflowState::WaitUserDecision),
            Just(WorkflowState::Paused),
            Just(WorkflowState::Completed),
            Just(WorkflowState::Failed),
        ]
    }

    pub fn arb_task_state() -> impl Strategy<Value = TaskState> {
        prop_oneof![
            Just(TaskState::Created),
            Just(TaskState::Ready),
            Just(TaskState::Dispatching),
            Just(TaskState::Dispatched),
            Just(TaskState::Running),
            Just(TaskState::ExecutionSucceeded),
            Just(TaskState::Reviewing),
            Just(TaskState::Done),
            Just(TaskState::ExecutionFailed),
            Just(TaskState::ReworkRequired),
            Just(TaskState::Blocked),
        ]
    }

    pub fn arb_mailbox_status() -> impl Strategy<Value = MailboxStatus> {
        prop_oneof![
            Just(MailboxStatus::Pending),
            Just(MailboxStatus::Processing),
            Just(MailboxStatus::Completed),
            Just(MailboxStatus::Failed),
        ]
    }
}
