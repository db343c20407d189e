// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::task::TaskNode;

#[test]
fn happy_path_drives_through_every_phase_to_completion() {
    let mut wf = Workflow::new(SessionId::new(), "ship the feature", 0);
    assert!(wf.transition(WorkflowState::SemanticUnderstanding, 1));
    assert!(wf.transition(WorkflowState::RoutingDecision, 2));
    assert!(wf.transition(WorkflowState::PlanLoop, 3));
    assert!(wf.transition(WorkflowState::Execution, 4));
    assert!(wf.transition(WorkflowState::Review, 5));
    assert!(wf.transition(WorkflowState::Completed, 6));
    assert!(wf.state.is_terminal());
}

#[test]
fn paused_is_reachable_from_any_non_terminal_state_and_resumes_to_execution() {
    let mut wf = Workflow::new(SessionId::new(), "long task", 0);
    wf.transition(WorkflowState::SemanticUnderstanding, 1);
    assert!(wf.transition(WorkflowState::Paused, 2));
    assert!(wf.transition(WorkflowState::Execution, 3));
}

#[test]
fn terminal_states_reject_every_further_transition() {
    let mut wf = Workflow::new(SessionId::new(), "done already", 0);
    wf.transition(WorkflowState::SemanticUnderstanding, 1);
    wf.transition(WorkflowState::RoutingDecision, 2);
    wf.transition(WorkflowState::PlanLoop, 3);
    wf.transition(WorkflowState::Failed, 4);
    assert!(!wf.transition(WorkflowState::Execution, 5));
    assert!(!wf.transition(WorkflowState::Paused, 5));
}

#[test]
fn ready_tasks_respect_blocked_by_edges() {
    let mut wf = Workflow::new(SessionId::new(), "build the thing", 0);
    let a = TaskNode::new(TaskId::new(), "a", 3, 0);
    let a_id = a.id;
    let mut b = TaskNode::new(TaskId::new(), "b", 3, 0);
    b.blocked_by = vec![a_id];
    let b_id = b.id;
    wf.add_task(a);
    wf.add_task(b);

    assert_eq!(wf.ready_tasks(), vec![a_id]);

    if let Some(task) = wf.tasks.get_mut(&a_id) {
        task.transition(TaskState::Ready, 1);
        task.transition(TaskState::Dispatching, 2);
        task.transition(TaskState::Dispatched, 3);
        task.transition(TaskState::Running, 4);
        task.transition(TaskState::ExecutionSucceeded, 5);
        task.transition(TaskState::Reviewing, 6);
        task.transition(TaskState::Done, 7);
    }
    assert_eq!(wf.ready_tasks(), vec![b_id]);
}

#[test]
fn all_tasks_terminal_requires_a_non_empty_arena() {
    let wf = Workflow::new(SessionId::new(), "empty", 0);
    assert!(!wf.all_tasks_terminal());
}

#[test]
fn workflow_serde_round_trips_task_arena() {
    let mut wf = Workflow::new(SessionId::new(), "persisted", 0);
    wf.add_task(TaskNode::new(TaskId::new(), "step one", 3, 0));
    let json = serde_json::to_string(&wf).unwrap();
    let back: Workflow = serde_json::from_str(&json).unwrap();
    assert_eq!(back.tasks.len(), 1);
    assert_eq!(back.id, wf.id);
}
