// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use weave_core::FakeClock;

struct EchoHandler;

#[async_trait]
impl InputHandler for EchoHandler {
    async fn handle(&self, message: &HubMessage) -> HandlerResult {
        Ok(message.payload.clone())
    }
}

struct FailingHandler;

#[async_trait]
impl InputHandler for FailingHandler {
    async fn handle(&self, _message: &HubMessage) -> HandlerResult {
        Err("boom".to_string())
    }
}

fn hub() -> MessageHub<FakeClock> {
    MessageHub::new(FakeClock::new(), EventBus::new())
}

fn input_module() -> Module {
    Module::new(ModuleId::new(), ModuleKind::Input)
}

#[tokio::test]
async fn register_and_blocking_send_returns_handler_result() {
    let hub = hub();
    let module = input_module();
    let id = module.id;
    hub.register_input(module, std::sync::Arc::new(EchoHandler)).unwrap();

    let outcome = hub
        .send(id, HubMessage::new("ping", serde_json::json!({"n": 1})), SendOptions { blocking: true, ..Default::default() }, None)
        .await
        .unwrap();

    assert_eq!(outcome.result, Some(serde_json::json!({"n": 1})));
    let entry = hub.get_by_message_id(outcome.message_id).unwrap();
    assert_eq!(entry.status, MailboxStatus::Completed);
}

#[tokio::test]
async fn non_blocking_send_returns_before_handler_completes() {
    let hub = hub();
    let module = input_module();
    let id = module.id;
    hub.register_input(module, std::sync::Arc::new(EchoHandler)).unwrap();

    let outcome = hub
        .send(id, HubMessage::new("ping", serde_json::json!(null)), SendOptions::default(), None)
        .await
        .unwrap();

    assert!(outcome.result.is_none());
}

#[tokio::test]
async fn blocking_send_surfaces_handler_failure() {
    let hub = hub();
    let module = input_module();
    let id = module.id;
    hub.register_input(module, std::sync::Arc::new(FailingHandler)).unwrap();

    let result = hub
        .send(id, HubMessage::new("ping", serde_json::json!(null)), SendOptions { blocking: true, ..Default::default() }, None)
        .await;

    assert!(matches!(result, Err(HubError::HandlerFailed { .. })));
}

#[tokio::test]
async fn send_to_unknown_module_errors() {
    let hub = hub();
    let result = hub
        .send(ModuleId::new(), HubMessage::new("ping", serde_json::json!(null)), SendOptions::default(), None)
        .await;
    assert!(matches!(result, Err(HubError::UnknownModule { .. })));
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let hub = hub();
    let module = input_module();
    hub.register_input(module.clone(), std::sync::Arc::new(EchoHandler)).unwrap();
    let err = hub.register_input(module, std::sync::Arc::new(EchoHandler)).unwrap_err();
    assert!(matches!(err, HubError::AlreadyRegistered { .. }));
}

#[tokio::test]
async fn callback_id_replay_returns_the_same_mailbox_entry() {
    let hub = hub();
    let module = input_module();
    let id = module.id;
    hub.register_input(module, std::sync::Arc::new(EchoHandler)).unwrap();

    let opts = SendOptions { blocking: true, ..Default::default() };
    let first = hub
        .send(id, HubMessage::new("ping", serde_json::json!(1)), opts, Some("req-1".to_string()))
        .await
        .unwrap();
    let second = hub
        .send(id, HubMessage::new("ping", serde_json::json!(2)), opts, Some("req-1".to_string()))
        .await
        .unwrap();

    assert_eq!(first.message_id, second.message_id);
    assert_eq!(second.result, Some(serde_json::json!(1)));
}

#[test]
fn route_resolution_picks_highest_priority_match() {
    let hub = hub();
    let low = ModuleId::new();
    let high = ModuleId::new();
    hub.add_route(Route { pattern: RoutePattern::MessageType("task.update".into()), target_output: low, priority: 0 });
    hub.add_route(Route { pattern: RoutePattern::MessageType("task.update".into()), target_output: high, priority: 10 });

    let resolved = hub.resolve_route(&HubMessage::new("task.update", serde_json::json!(null))).unwrap();
    assert_eq!(resolved, high);
}

#[test]
fn route_resolution_with_no_match_errors() {
    let hub = hub();
    let result = hub.resolve_route(&HubMessage::new("unmapped", serde_json::json!(null)));
    assert!(matches!(result, Err(HubError::NoRoute { .. })));
}

#[tokio::test]
async fn unregister_removes_module_and_its_routes() {
    let hub = hub();
    let module = input_module();
    let id = module.id;
    hub.register_input(module, std::sync::Arc::new(EchoHandler)).unwrap();
    hub.add_route(Route { pattern: RoutePattern::MessageType("x".into()), target_output: id, priority: 0 });

    hub.unregister(id).unwrap();

    assert!(hub.module(id).is_none());
    assert!(matches!(hub.resolve_route(&HubMessage::new("x", serde_json::json!(null))), Err(HubError::NoRoute { .. })));
}

#[tokio::test]
async fn evict_expired_drops_old_mailbox_entries() {
    let clock = FakeClock::new();
    let hub = MessageHub::new(clock.clone(), EventBus::new());
    let module = input_module();
    let id = module.id;
    hub.register_input(module, std::sync::Arc::new(EchoHandler)).unwrap();

    let outcome = hub
        .send(id, HubMessage::new("ping", serde_json::json!(null)), SendOptions { blocking: true, ..Default::default() }, None)
        .await
        .unwrap();

    clock.advance(MAILBOX_TTL + std::time::Duration::from_secs(1));
    hub.evict_expired();

    assert!(hub.get_by_message_id(outcome.message_id).is_none());
}
