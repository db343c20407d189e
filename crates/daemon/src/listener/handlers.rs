// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps each [`Request`] onto the runtime it addresses (§6).

use std::sync::Arc;
use std::time::Duration;

use weave_core::{AgentInstanceState, AgentPoolError, Module, ModuleId};
use weave_engine::hub::{HubMessage, SendOptions};
use weave_engine::{DispatchOutcome, DispatchRequest};

use super::{ListenCtx, RemoteModuleHandler};
use crate::config::PROTOCOL_VERSION;
use crate::protocol::{AgentControlAction, ModuleDescriptor, Request, Response};

pub async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,
        Request::Hello => Response::Hello { version: PROTOCOL_VERSION.to_string() },

        Request::SendMessage { target, message_type, payload, blocking, callback_id } => {
            handle_send_message(ctx, target, message_type, payload, blocking, callback_id).await
        }
        Request::RegisterModule { descriptor } => handle_register_module(ctx, descriptor).await,
        Request::WorkflowPause { workflow_id } => {
            let daemon = ctx.daemon.lock().await;
            to_response(daemon.runtime.workflow_manager.pause(workflow_id).map(|_| Response::Ok))
        }
        Request::WorkflowResume { workflow_id } => {
            let daemon = ctx.daemon.lock().await;
            to_response(daemon.runtime.workflow_manager.resume(workflow_id).map(|_| Response::Ok))
        }
        Request::WorkflowCancel { workflow_id } => {
            let daemon = ctx.daemon.lock().await;
            to_response(
                daemon
                    .runtime
                    .workflow_manager
                    .transition(workflow_id, weave_core::WorkflowState::Failed)
                    .map(|_| Response::Ok),
            )
        }
        Request::WorkflowInput { workflow_id, input } => {
            let daemon = ctx.daemon.lock().await;
            match daemon.runtime.instruction_bus.deliver_workflow_input(workflow_id, input) {
                weave_engine::instruction_bus::DeliveryOutcome::ResolvedAsk(ask_id) => {
                    Response::InputDelivered { ask_id: Some(ask_id.to_string()) }
                }
                weave_engine::instruction_bus::DeliveryOutcome::QueuedInstruction => {
                    Response::InputDelivered { ask_id: None }
                }
            }
        }
        Request::AgentDispatch { source_session, target, queue_on_busy, max_queue_wait_ms } => {
            handle_agent_dispatch(ctx, source_session, target, queue_on_busy, max_queue_wait_ms).await
        }
        Request::AgentControl { action, target } => handle_agent_control(ctx, action, target).await,
        Request::Shutdown => {
            ctx.shutdown.notify_waiters();
            Response::ShuttingDown
        }
    }
}

async fn handle_send_message(
    ctx: &ListenCtx,
    target: String,
    message_type: String,
    payload: serde_json::Value,
    blocking: bool,
    callback_id: Option<String>,
) -> Response {
    let daemon = ctx.daemon.lock().await;
    let target = ModuleId::from_string(&target);
    let message = HubMessage::new(message_type, payload);
    let opts = SendOptions { blocking, timeout: ctx.config.ipc_timeout };
    match daemon.runtime.hub.send(target, message, opts, callback_id).await {
        Ok(outcome) => Response::SendMessageResult {
            message_id: outcome.message_id.to_string(),
            result: outcome.result,
        },
        Err(e) => Response::error("hub", e.to_string()),
    }
}

async fn handle_register_module(ctx: &ListenCtx, descriptor: ModuleDescriptor) -> Response {
    let daemon = ctx.daemon.lock().await;
    let kind = descriptor.kind;
    let module = Module::new(ModuleId::new(), kind).with_capabilities(descriptor.capabilities);
    let id = module.id;
    let handler = Arc::new(RemoteModuleHandler);
    let result = match kind {
        weave_core::ModuleKind::Input => daemon.runtime.hub.register_input(module, handler),
        weave_core::ModuleKind::Output => daemon.runtime.hub.register_output(module, handler),
        weave_core::ModuleKind::Agent => daemon.runtime.hub.register_agent(module, handler),
    };
    match result {
        Ok(()) => Response::Registered { id: id.to_string() },
        Err(e) => Response::error("hub", e.to_string()),
    }
}

async fn handle_agent_dispatch(
    ctx: &ListenCtx,
    source_session: weave_core::SessionId,
    target: weave_core::AgentInstanceId,
    queue_on_busy: bool,
    max_queue_wait_ms: Option<u64>,
) -> Response {
    let daemon = ctx.daemon.lock().await;
    let Some(session) = daemon.session_store.get_session(source_session) else {
        return Response::error("not_found", format!("unknown session: {source_session}"));
    };
    let request = DispatchRequest {
        source_session: session,
        target,
        queue_on_busy,
        max_queue_wait: max_queue_wait_ms
            .map(Duration::from_millis)
            .unwrap_or(weave_engine::agent_pool::MIN_QUEUE_WAIT),
    };
    match daemon.runtime.agent_pool.dispatch(request).await {
        Ok(DispatchOutcome::Dispatched(session_id)) => {
            Response::DispatchResult { session_id, queued: false }
        }
        Ok(DispatchOutcome::Queued(session_id)) => {
            Response::DispatchResult { session_id, queued: true }
        }
        Err(e) => Response::error("agent_pool", e.to_string()),
    }
}

async fn handle_agent_control(
    ctx: &ListenCtx,
    action: AgentControlAction,
    target: weave_core::AgentInstanceId,
) -> Response {
    let daemon = ctx.daemon.lock().await;
    let agent_log_dir = daemon.config.state_dir.join("agents");
    match action {
        AgentControlAction::Status => match daemon.runtime.agent_pool.instance(target) {
            Some(instance) => Response::AgentStatus { state: instance.state },
            None => Response::error(
                "not_found",
                AgentPoolError::UnknownAgent { id: target.to_string() }.to_string(),
            ),
        },
        AgentControlAction::Interrupt | AgentControlAction::Cancel => {
            to_response(daemon.runtime.agent_pool.stop(target, format!("{action:?}")).await.map(|_| Response::Ok))
        }
        AgentControlAction::Pause => {
            to_response(daemon.runtime.agent_pool.stop(target, "paused via agent.control").await.map(|_| Response::Ok))
        }
        AgentControlAction::Resume => {
            let outcome = if daemon
                .runtime
                .agent_pool
                .instance(target)
                .is_some_and(|i| i.state == AgentInstanceState::Crashed)
            {
                daemon.runtime.agent_pool.restart(target, "resumed via agent.control", &agent_log_dir).await
            } else {
                daemon.runtime.agent_pool.start(target, &agent_log_dir).await
            };
            to_response(outcome.map(|_| Response::Ok))
        }
    }
}

fn to_response<E: std::fmt::Display>(result: Result<Response, E>) -> Response {
    result.unwrap_or_else(|e| Response::error("internal", e.to_string()))
}
