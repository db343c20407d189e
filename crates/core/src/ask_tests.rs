// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn resolve_is_idempotent_once_set() {
    let mut ask = Ask::new(AskScope::Workflow(WorkflowId::new()), "approve?", 0);
    assert!(ask.resolve("yes"));
    assert!(!ask.resolve("no"));
    assert_eq!(ask.resolution.as_deref(), Some("yes"));
}

#[test]
fn oldest_pending_ask_for_workflow_skips_resolved_and_other_scopes() {
    let wf = WorkflowId::new();
    let other_wf = WorkflowId::new();
    let mut resolved = Ask::new(AskScope::Workflow(wf), "first?", 0);
    resolved.resolve("done");
    let pending = Ask::new(AskScope::Workflow(wf), "second?", 1);
    let other_scope = Ask::new(AskScope::Workflow(other_wf), "unrelated?", 2);

    let asks = vec![resolved, pending.clone(), other_scope];
    let idx = oldest_pending_ask_for_workflow(&asks, wf).unwrap();
    assert_eq!(asks[idx].id, pending.id);
}

#[test]
fn no_pending_ask_returns_none_for_a_fresh_workflow() {
    let asks: Vec<Ask> = vec![];
    assert!(oldest_pending_ask_for_workflow(&asks, WorkflowId::new()).is_none());
}
