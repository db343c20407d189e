// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon's top-level `Runtime` (§2, §9 "shared mutable runtime
//! singletons"): owns one each of the five subsystems, constructed once in
//! dependency order and handed to the transport layer as a single `Arc`-shared
//! value — never re-constructed per request.
//!
//! ```text
//! EventBus → MessageHub
//!          → WorkflowManager
//!          → InstructionBus
//!          → ConcurrencyScheduler → ResourcePool
//!          → AgentPool            → SessionStore (weave-storage, outside this crate)
//! ```

use weave_adapters::{HealthChecker, ProcessAdapter};
use weave_core::Clock;

use crate::agent_pool::AgentPool;
use crate::event_bus::EventBus;
use crate::hub::MessageHub;
use crate::instruction_bus::InstructionBus;
use crate::scheduler::{ConcurrencyScheduler, SchedulerConfig};
use crate::workflow_manager::WorkflowManager;

/// Every subsystem the daemon needs, constructed once at startup (§2 Process
/// shape) and shared from there — callers clone `Arc<Runtime<..>>`, not the
/// runtime itself.
pub struct Runtime<C: Clock, P: ProcessAdapter, H: HealthChecker> {
    pub events: EventBus,
    pub hub: MessageHub<C>,
    pub workflow_manager: WorkflowManager<C>,
    pub instruction_bus: InstructionBus<C>,
    pub scheduler: ConcurrencyScheduler<C>,
    pub agent_pool: AgentPool<C, P, H>,
}

impl<C: Clock, P: ProcessAdapter, H: HealthChecker> Runtime<C, P, H> {
    /// Build the runtime in the dependency order from §2's data-flow diagram:
    /// the event bus first (every other subsystem broadcasts through it),
    /// then the hub, workflow manager, instruction bus, scheduler, and
    /// finally the agent pool.
    pub fn new(clock: C, process: P, health: H, scheduler_config: SchedulerConfig) -> Self {
        let events = EventBus::new();
        let hub = MessageHub::new(clock.clone(), events.clone());
        let workflow_manager = WorkflowManager::new(clock.clone(), events.clone());
        let instruction_bus = InstructionBus::new(clock.clone());
        let scheduler = ConcurrencyScheduler::new(clock.clone(), scheduler_config);
        let agent_pool = AgentPool::new(clock, process, health, events.clone());

        Self { events, hub, workflow_manager, instruction_bus, scheduler, agent_pool }
    }

    /// A fresh subscriber to every outbound event this runtime's subsystems
    /// broadcast (§6 "Outbound events").
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<crate::event_bus::OutboundEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
