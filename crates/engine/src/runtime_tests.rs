// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use weave_adapters::{FakeHealthChecker, FakeProcessAdapter};
use weave_core::{AgentConfig, AgentConfigId, AgentTransport, FakeClock, SessionId};

fn runtime() -> Runtime<FakeClock, FakeProcessAdapter, FakeHealthChecker> {
    Runtime::new(FakeClock::new(), FakeProcessAdapter::new(), FakeHealthChecker::new(), SchedulerConfig::default())
}

#[test]
fn construction_wires_every_subsystem_to_the_same_event_bus() {
    let runtime = runtime();
    let mut subscriber = runtime.subscribe();

    let workflow_id = runtime.workflow_manager.create(SessionId::new(), "build a thing");

    let event = subscriber.try_recv().unwrap();
    match event {
        crate::event_bus::OutboundEvent::WorkflowUpdate { id, .. } => assert_eq!(id, workflow_id),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn agent_pool_and_scheduler_share_the_runtime_clock() {
    let runtime = runtime();
    let config = AgentConfig {
        id: AgentConfigId::new(),
        name: "worker".to_string(),
        transport: AgentTransport::ChildProcess,
        command: "true".to_string(),
        args: Vec::new(),
        env: Default::default(),
        max_concurrency: 1,
        health_check_interval_ms: 10_000,
        restart_backoff_base_ms: 100,
        max_restart_attempts: 3,
    };
    let config_id = config.id;
    runtime.agent_pool.register_config(config).unwrap();
    let instance_id = runtime.agent_pool.instantiate(config_id).unwrap();

    runtime.agent_pool.start(instance_id, &std::path::PathBuf::from("/tmp")).await.unwrap();
    assert_eq!(runtime.agent_pool.instance(instance_id).unwrap().state, weave_core::AgentInstanceState::Running);

    runtime.scheduler.register_resource("cpu", 2);
    let decision = runtime.scheduler.evaluate_scheduling("run it", &[]).unwrap();
    assert!(decision.estimated_duration_ms > 0);
}

#[test]
fn instruction_bus_and_hub_are_independently_usable() {
    let runtime = runtime();
    let workflow_id = runtime.workflow_manager.create(SessionId::new(), "do a thing");

    let ask_id = runtime.instruction_bus.raise_ask(weave_core::AskScope::Workflow(workflow_id), "need input");
    let pending = runtime.instruction_bus.pending_asks_for_workflow(workflow_id);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, ask_id);
}
