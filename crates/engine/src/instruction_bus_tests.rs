// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use weave_core::FakeClock;

#[test]
fn delivering_input_with_no_pending_ask_queues_an_instruction() {
    let bus = InstructionBus::new(FakeClock::new());
    let workflow_id = WorkflowId::new();

    let outcome = bus.deliver_workflow_input(workflow_id, "proceed");

    assert_eq!(outcome, DeliveryOutcome::QueuedInstruction);
    let instructions = bus.take_instructions_for(&AskScope::Workflow(workflow_id));
    assert_eq!(instructions.len(), 1);
    assert_eq!(instructions[0].instruction, "proceed");
}

#[test]
fn delivering_input_resolves_the_oldest_pending_ask() {
    let bus = InstructionBus::new(FakeClock::new());
    let workflow_id = WorkflowId::new();
    let ask_id = bus.raise_ask(AskScope::Workflow(workflow_id), "which file?");

    let outcome = bus.deliver_workflow_input(workflow_id, "main.rs");

    assert_eq!(outcome, DeliveryOutcome::ResolvedAsk(ask_id));
    assert!(bus.pending_asks_for_workflow(workflow_id).is_empty());
}

#[test]
fn second_delivery_after_ask_resolved_queues_instead_of_resolving_again() {
    let bus = InstructionBus::new(FakeClock::new());
    let workflow_id = WorkflowId::new();
    bus.raise_ask(AskScope::Workflow(workflow_id), "which file?");
    bus.deliver_workflow_input(workflow_id, "main.rs");

    let outcome = bus.deliver_workflow_input(workflow_id, "also this");

    assert_eq!(outcome, DeliveryOutcome::QueuedInstruction);
}

#[test]
fn take_instructions_only_drains_matching_scope() {
    let bus = InstructionBus::new(FakeClock::new());
    let a = WorkflowId::new();
    let b = WorkflowId::new();
    bus.deliver_workflow_input(a, "for a");
    bus.deliver_workflow_input(b, "for b");

    let for_a = bus.take_instructions_for(&AskScope::Workflow(a));
    assert_eq!(for_a.len(), 1);
    assert_eq!(for_a[0].instruction, "for a");

    // Draining scope a must not have consumed b's instruction.
    let for_b = bus.take_instructions_for(&AskScope::Workflow(b));
    assert_eq!(for_b.len(), 1);
}

#[test]
fn take_instructions_is_consume_once() {
    let bus = InstructionBus::new(FakeClock::new());
    let workflow_id = WorkflowId::new();
    bus.deliver_workflow_input(workflow_id, "proceed");

    assert_eq!(bus.take_instructions_for(&AskScope::Workflow(workflow_id)).len(), 1);
    assert!(bus.take_instructions_for(&AskScope::Workflow(workflow_id)).is_empty());
}
