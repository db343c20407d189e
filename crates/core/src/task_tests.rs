// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn happy_path_runs_end_to_end() {
    let mut task = TaskNode::new(TaskId::new(), "write the docs", 5, 0);
    assert!(task.transition(TaskState::Ready, 1));
    assert!(task.transition(TaskState::Dispatching, 2));
    assert!(task.transition(TaskState::Dispatched, 3));
    assert!(task.transition(TaskState::Running, 4));
    assert!(task.transition(TaskState::ExecutionSucceeded, 5));
    assert!(task.transition(TaskState::Reviewing, 6));
    assert!(task.transition(TaskState::Done, 7));
    assert!(task.state.is_terminal());
}

#[test]
fn rework_loop_returns_task_to_ready() {
    let mut task = TaskNode::new(TaskId::new(), "fix the bug", 5, 0);
    task.transition(TaskState::Ready, 1);
    task.transition(TaskState::Dispatching, 2);
    task.transition(TaskState::Dispatched, 3);
    task.transition(TaskState::Running, 4);
    assert!(task.transition(TaskState::ExecutionFailed, 5));
    assert!(task.transition(TaskState::ReworkRequired, 6));
    assert!(task.transition(TaskState::Ready, 7));
    assert_eq!(task.state, TaskState::Ready);
}

#[test]
fn illegal_transition_is_rejected_and_state_unchanged() {
    let mut task = TaskNode::new(TaskId::new(), "skip ahead", 5, 0);
    assert!(!task.transition(TaskState::Done, 1));
    assert_eq!(task.state, TaskState::Created);
}

#[test]
fn exhausted_rework_can_end_in_blocked() {
    let mut task = TaskNode::new(TaskId::new(), "unfixable", 1, 0);
    task.transition(TaskState::Ready, 1);
    task.transition(TaskState::Dispatching, 2);
    task.transition(TaskState::Dispatched, 3);
    task.transition(TaskState::Running, 4);
    task.transition(TaskState::ExecutionFailed, 5);
    assert!(task.transition(TaskState::Blocked, 6));
    assert!(task.state.is_terminal());
}

#[test]
fn task_serde_round_trips_with_blocked_by_edges() {
    let mut task = TaskNode::new(TaskId::new(), "depends on others", 3, 0);
    task.blocked_by = vec![TaskId::new(), TaskId::new()];
    let json = serde_json::to_string(&task).unwrap();
    let back: TaskNode = serde_json::from_str(&json).unwrap();
    assert_eq!(back.blocked_by.len(), 2);
}
