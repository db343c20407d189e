// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routing layer for `workflow.input` (§6) built on [`weave_core::ask`]'s
//! data types: deliver to the oldest pending ask for a scope if one exists,
//! otherwise enqueue a runtime instruction for the next planner round (§4.3).

use parking_lot::Mutex;
use weave_core::{oldest_pending_ask_for_workflow, Ask, AskId, AskScope, Clock, RuntimeInstruction, WorkflowId};

struct State {
    asks: Vec<Ask>,
    instructions: Vec<RuntimeInstruction>,
}

pub struct InstructionBus<C: Clock> {
    clock: C,
    state: Mutex<State>,
}

impl<C: Clock> InstructionBus<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, state: Mutex::new(State { asks: Vec::new(), instructions: Vec::new() }) }
    }

    /// Raise a new ask, returning its id so the caller (Workflow Manager or
    /// Agent Pool) can correlate it with the pause that created it.
    pub fn raise_ask(&self, scope: AskScope, prompt: impl Into<String>) -> AskId {
        let mut state = self.state.lock();
        let ask = Ask::new(scope, prompt, self.clock.epoch_ms());
        let id = ask.id;
        state.asks.push(ask);
        id
    }

    pub fn pending_asks_for_workflow(&self, workflow_id: WorkflowId) -> Vec<Ask> {
        let state = self.state.lock();
        state
            .asks
            .iter()
            .filter(|a| !a.is_resolved() && a.scope.matches_workflow(workflow_id))
            .cloned()
            .collect()
    }

    /// §6 `workflow.input`: resolve the oldest pending ask for `workflow_id`
    /// if one exists; otherwise enqueue `input` as a runtime instruction so
    /// the next planner round for that scope picks it up (§4.3).
    pub fn deliver_workflow_input(&self, workflow_id: WorkflowId, input: impl Into<String>) -> DeliveryOutcome {
        let mut state = self.state.lock();
        let input = input.into();
        if let Some(idx) = oldest_pending_ask_for_workflow(&state.asks, workflow_id) {
            let resolved = state.asks[idx].resolve(input);
            debug_assert!(resolved, "oldest_pending_ask_for_workflow only returns unresolved asks");
            return DeliveryOutcome::ResolvedAsk(state.asks[idx].id);
        }
        let scope = AskScope::Workflow(workflow_id);
        state.instructions.push(RuntimeInstruction { scope, instruction: input, created_at_ms: self.clock.epoch_ms() });
        DeliveryOutcome::QueuedInstruction
    }

    /// Consume (drain) every pending runtime instruction matching `scope`.
    /// Each instruction is delivered exactly once (§4.3).
    pub fn take_instructions_for(&self, scope: &AskScope) -> Vec<RuntimeInstruction> {
        let mut state = self.state.lock();
        let (matching, rest): (Vec<_>, Vec<_>) = state.instructions.drain(..).partition(|i| &i.scope == scope);
        state.instructions = rest;
        matching
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    ResolvedAsk(AskId),
    QueuedInstruction,
}

#[cfg(test)]
#[path = "instruction_bus_tests.rs"]
mod tests;
