// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent Pool & Runtime (§4.4): launch, supervise, and tear down agent
//! workers; maintain health; restart on crash with backoff; bind dispatched
//! tasks to sub-sessions.
//!
//! The pool is a typed map `instanceId -> AgentInstance`; supervisors never
//! reach into each other's state, and every lifecycle change is both applied
//! here and broadcast on the event bus rather than mutated from an arbitrary
//! call site (§4.4 "communicate... exclusively through typed lifecycle events").

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use weave_adapters::{HealthChecker, ProcessAdapter, ProcessError, ProcessHandle, SpawnSpec};
use weave_core::{
    exponential_backoff_ms, AgentConfig, AgentConfigId, AgentInstance, AgentInstanceId, AgentInstanceState,
    AgentPoolError, AgentTransport, Clock, DeadlineSet, Session, SessionId,
};
use weave_storage::BoundedJsonlLog;

use crate::event_bus::{EventBus, OutboundEvent};

/// Backoff is capped at 30s regardless of restart count (§4.4 `restart`).
pub const MAX_RESTART_BACKOFF_MS: u64 = 30_000;
/// Floor applied to `max_queue_wait` on a blocking dispatch (§4.4 step 4).
pub const MIN_QUEUE_WAIT: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Register,
    Start,
    Stop,
    Restart,
    Crash,
    HealthCheckFailed,
}

impl From<HistoryKind> for weave_storage::AgentHistoryKind {
    fn from(kind: HistoryKind) -> Self {
        match kind {
            HistoryKind::Register => weave_storage::AgentHistoryKind::Register,
            HistoryKind::Start => weave_storage::AgentHistoryKind::Start,
            HistoryKind::Stop => weave_storage::AgentHistoryKind::Stop,
            HistoryKind::Restart => weave_storage::AgentHistoryKind::Restart,
            HistoryKind::Crash => weave_storage::AgentHistoryKind::Crash,
            HistoryKind::HealthCheckFailed => weave_storage::AgentHistoryKind::HealthCheckFailed,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HistoryEntry {
    pub instance_id: AgentInstanceId,
    pub kind: HistoryKind,
    pub reason: Option<String>,
    pub at_ms: u64,
}

/// Most recent history entries retained in memory; `weave-storage` applies
/// the same tail-1000 bound to the persisted JSONL log (§4.4 Persistence).
pub const MAX_HISTORY_ENTRIES: usize = 1000;

pub struct DispatchRequest {
    pub source_session: Session,
    pub target: AgentInstanceId,
    pub queue_on_busy: bool,
    pub max_queue_wait: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Dispatched immediately; a fresh sub-session id bound to `target`.
    Dispatched(SessionId),
    /// Queued behind a busy target; still resolves to the same sub-session
    /// id once the instance frees up within `max_queue_wait`.
    Queued(SessionId),
}

struct State<P: ProcessAdapter> {
    configs: HashMap<AgentConfigId, AgentConfig>,
    instances: HashMap<AgentInstanceId, AgentInstance>,
    handles: HashMap<AgentInstanceId, ProcessHandle>,
    ports: HashMap<AgentInstanceId, u16>,
    next_port: u16,
    busy: HashSet<AgentInstanceId>,
    health_deadlines: DeadlineSet<AgentInstanceId>,
    restart_deadlines: DeadlineSet<AgentInstanceId>,
    history: VecDeque<HistoryEntry>,
    _adapter: std::marker::PhantomData<P>,
}

pub struct AgentPool<C: Clock, P: ProcessAdapter, H: HealthChecker> {
    clock: C,
    process: P,
    health: H,
    events: EventBus,
    history_log: Option<BoundedJsonlLog<weave_storage::AgentHistoryEntry>>,
    state: Mutex<State<P>>,
}

impl<C: Clock, P: ProcessAdapter, H: HealthChecker> AgentPool<C, P, H> {
    /// `history_log` persists every recorded lifecycle entry as JSONL
    /// (§4.4 Persistence); pass `None` to keep the in-memory tail only,
    /// as tests do.
    pub fn new(
        clock: C,
        process: P,
        health: H,
        events: EventBus,
        history_log: Option<BoundedJsonlLog<weave_storage::AgentHistoryEntry>>,
    ) -> Self {
        Self {
            clock,
            process,
            health,
            events,
            history_log,
            state: Mutex::new(State {
                configs: HashMap::new(),
                instances: HashMap::new(),
                handles: HashMap::new(),
                ports: HashMap::new(),
                next_port: 20_000,
                busy: HashSet::new(),
                health_deadlines: DeadlineSet::new(),
                restart_deadlines: DeadlineSet::new(),
                history: VecDeque::new(),
            }),
        }
    }

    pub fn register_config(&self, config: AgentConfig) -> Result<(), AgentPoolError> {
        let mut state = self.state.lock();
        if state.configs.contains_key(&config.id) {
            return Err(AgentPoolError::AlreadyRegistered { id: config.id.to_string() });
        }
        state.configs.insert(config.id, config);
        Ok(())
    }

    /// Create a `REGISTERED` instance of `config_id` (§4.4 `register`).
    pub fn instantiate(&self, config_id: AgentConfigId) -> Result<AgentInstanceId, AgentPoolError> {
        let mut state = self.state.lock();
        if !state.configs.contains_key(&config_id) {
            return Err(AgentPoolError::UnknownAgent { id: config_id.to_string() });
        }
        let instance = AgentInstance::new(config_id, self.clock.epoch_ms());
        let id = instance.id;
        state.instances.insert(id, instance);
        self.record(&mut state, id, HistoryKind::Register, None);
        Ok(id)
    }

    pub fn instance(&self, id: AgentInstanceId) -> Option<AgentInstance> {
        self.state.lock().instances.get(&id).cloned()
    }

    /// §4.4 `start`: spawn the child process (or mark running immediately for
    /// in-process agents), schedule the first health-check tick.
    pub async fn start(&self, id: AgentInstanceId, log_dir: &std::path::Path) -> Result<(), AgentPoolError> {
        let (config, transport, port) = {
            let mut state = self.state.lock();
            let instance = state.instances.get_mut(&id).ok_or_else(|| AgentPoolError::UnknownAgent { id: id.to_string() })?;
            if !instance.transition(AgentInstanceState::Starting, self.clock.epoch_ms()) {
                return Err(AgentPoolError::UnknownAgent { id: id.to_string() });
            }
            let config = state.configs.get(&instance.config_id).cloned().ok_or_else(|| AgentPoolError::UnknownAgent { id: id.to_string() })?;
            let port = match state.ports.get(&id) {
                Some(port) => *port,
                None => {
                    let port = state.next_port;
                    state.next_port += 1;
                    state.ports.insert(id, port);
                    port
                }
            };
            let transport = config.transport;
            (config, transport, port)
        };

        if transport == AgentTransport::ChildProcess {
            let spec = SpawnSpec {
                command: config.command.clone(),
                args: config.args.clone(),
                env: config.env.clone(),
                agent_id: id.to_string(),
                agent_port: port,
                log_path: log_dir.join(format!("{id}.log")),
                pid_path: log_dir.join(format!("{id}.pid")),
            };
            match self.process.spawn(&spec).await {
                Ok(handle) => {
                    let mut state = self.state.lock();
                    let pid = handle.pid;
                    state.handles.insert(id, handle);
                    if let Some(instance) = state.instances.get_mut(&id) {
                        instance.pid = Some(pid);
                        let _ = instance.transition(AgentInstanceState::Running, self.clock.epoch_ms());
                    }
                }
                Err(e) => {
                    let mut state = self.state.lock();
                    if let Some(instance) = state.instances.get_mut(&id) {
                        let _ = instance.transition(AgentInstanceState::Crashed, self.clock.epoch_ms());
                    }
                    self.record(&mut state, id, HistoryKind::Crash, Some(e.to_string()));
                    return Err(AgentPoolError::SpawnFailed { id: id.to_string(), message: e.to_string() });
                }
            }
        } else {
            let mut state = self.state.lock();
            if let Some(instance) = state.instances.get_mut(&id) {
                let _ = instance.transition(AgentInstanceState::Running, self.clock.epoch_ms());
            }
        }

        let mut state = self.state.lock();
        state.health_deadlines.schedule(id, self.clock.epoch_ms() + config.health_check_interval_ms);
        self.record(&mut state, id, HistoryKind::Start, None);
        drop(state);
        self.broadcast(id, AgentInstanceState::Running);
        Ok(())
    }

    /// §4.4 `stop`: SIGTERM, 5s grace, SIGKILL (delegated to [`ProcessAdapter::stop`]).
    pub async fn stop(&self, id: AgentInstanceId, reason: impl Into<String>) -> Result<(), AgentPoolError> {
        let reason = reason.into();
        {
            let mut state = self.state.lock();
            let instance = state.instances.get_mut(&id).ok_or_else(|| AgentPoolError::UnknownAgent { id: id.to_string() })?;
            let _ = instance.transition(AgentInstanceState::Stopping, self.clock.epoch_ms());
        }

        let handle = self.state.lock().handles.remove(&id);
        if let Some(mut handle) = handle {
            let _ = self.process.stop(&mut handle).await;
        }

        let mut state = self.state.lock();
        if let Some(instance) = state.instances.get_mut(&id) {
            let _ = instance.transition(AgentInstanceState::Stopped, self.clock.epoch_ms());
        }
        state.health_deadlines.cancel(&id);
        state.restart_deadlines.cancel(&id);
        state.busy.remove(&id);
        self.record(&mut state, id, HistoryKind::Stop, Some(reason));
        drop(state);
        self.broadcast(id, AgentInstanceState::Stopped);
        Ok(())
    }

    /// Mark a still-`Running` instance `Crashed` (the FSM's only path into a
    /// restart), tearing down its process handle without going through the
    /// terminal `Stopped` state that an operator-initiated [`Self::stop`] uses.
    async fn mark_crashed(&self, id: AgentInstanceId) {
        let handle = self.state.lock().handles.remove(&id);
        if let Some(mut handle) = handle {
            let _ = self.process.stop(&mut handle).await;
        }
        let mut state = self.state.lock();
        if let Some(instance) = state.instances.get_mut(&id) {
            let _ = instance.transition(AgentInstanceState::Crashed, self.clock.epoch_ms());
        }
        state.health_deadlines.cancel(&id);
        state.busy.remove(&id);
    }

    /// §4.4 `restart`: delay `restartBackoffMs * 2^restartCount` (capped
    /// 30s), then stop+start; `FAILED` once `restartCount >= maxRestarts`.
    pub async fn restart(&self, id: AgentInstanceId, reason: impl Into<String>, log_dir: &std::path::Path) -> Result<(), AgentPoolError> {
        let reason = reason.into();
        self.mark_crashed(id).await;

        let (backoff_base, restart_count) = {
            let mut state = self.state.lock();
            let instance = state.instances.get(&id).cloned().ok_or_else(|| AgentPoolError::UnknownAgent { id: id.to_string() })?;
            let config = state.configs.get(&instance.config_id).cloned().ok_or_else(|| AgentPoolError::UnknownAgent { id: id.to_string() })?;
            if instance.restart_count >= config.max_restart_attempts {
                if let Some(instance) = state.instances.get_mut(&id) {
                    let _ = instance.transition(AgentInstanceState::Failed, self.clock.epoch_ms());
                }
                self.record(&mut state, id, HistoryKind::Crash, Some("max_restarts_exceeded".to_string()));
                drop(state);
                self.broadcast(id, AgentInstanceState::Failed);
                return Err(AgentPoolError::MaxRestartsExceeded { id: id.to_string(), max_restarts: config.max_restart_attempts });
            }
            (config.restart_backoff_base_ms, instance.restart_count)
        };

        let delay_ms = exponential_backoff_ms(backoff_base, restart_count).min(MAX_RESTART_BACKOFF_MS);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        {
            let mut state = self.state.lock();
            if let Some(instance) = state.instances.get_mut(&id) {
                instance.restart_count += 1;
            }
            self.record(&mut state, id, HistoryKind::Restart, Some(reason));
        }
        self.start(id, log_dir).await
    }

    pub fn update_heartbeat(&self, id: AgentInstanceId) {
        let mut state = self.state.lock();
        if let Some(instance) = state.instances.get_mut(&id) {
            instance.record_heartbeat(self.clock.epoch_ms());
        }
    }

    /// Process every due health-check deadline (§4.4 "Health check"). Returns
    /// the instances that should be restarted as a result.
    pub async fn tick_health_checks(&self, heartbeat_timeout_ms: u64) -> Vec<AgentInstanceId> {
        let due = {
            let mut state = self.state.lock();
            state.health_deadlines.take_due(self.clock.epoch_ms())
        };
        let mut needs_restart = Vec::new();
        for id in due {
            let (last_heartbeat, port, interval_ms) = {
                let state = self.state.lock();
                let Some(instance) = state.instances.get(&id) else { continue };
                let Some(config) = state.configs.get(&instance.config_id) else { continue };
                let Some(port) = state.ports.get(&id).copied() else { continue };
                (instance.last_heartbeat_at_ms, port, config.health_check_interval_ms)
            };

            let now = self.clock.epoch_ms();
            let heartbeat_stale = last_heartbeat.map(|t| now.saturating_sub(t) > heartbeat_timeout_ms).unwrap_or(false);

            if heartbeat_stale {
                let mut state = self.state.lock();
                self.record(&mut state, id, HistoryKind::HealthCheckFailed, Some("heartbeat_timeout".to_string()));
                needs_restart.push(id);
            } else if self.health.check(port, Duration::from_millis(2_000)).await.is_err() {
                let mut state = self.state.lock();
                self.record(&mut state, id, HistoryKind::HealthCheckFailed, Some("health_check_failed".to_string()));
                needs_restart.push(id);
            } else {
                let mut state = self.state.lock();
                state.health_deadlines.schedule(id, now + interval_ms);
            }
        }
        needs_restart
    }

    /// §4.4 "Session binding & dispatch": admit, gate on busy/quota, and bind
    /// a fresh sub-session owned by `target`.
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome, AgentPoolError> {
        let target = request.target;
        {
            let state = self.state.lock();
            if !state.instances.contains_key(&target) {
                return Err(AgentPoolError::UnknownAgent { id: target.to_string() });
            }
        }

        let mut waited = Duration::ZERO;
        let wait_budget = request.max_queue_wait.max(MIN_QUEUE_WAIT);
        let queued = loop {
            let mut state = self.state.lock();
            if !state.busy.contains(&target) {
                state.busy.insert(target);
                break waited > Duration::ZERO;
            }
            drop(state);
            if !request.queue_on_busy {
                return Err(AgentPoolError::Busy { id: target.to_string() });
            }
            if waited >= wait_budget {
                return Err(AgentPoolError::QueueTimeout { id: target.to_string(), timeout_ms: wait_budget.as_millis() as u64 });
            }
            let step = Duration::from_millis(50);
            tokio::time::sleep(step).await;
            waited += step;
        };

        let now = self.clock.epoch_ms();
        let sub_session = Session::new_sub_session(&request.source_session, request.source_session.project_path.clone(), now);
        let sub_session_id = sub_session.id;

        let mut state = self.state.lock();
        if let Some(instance) = state.instances.get_mut(&target) {
            instance.bind_session(sub_session_id);
        }
        drop(state);

        if queued {
            Ok(DispatchOutcome::Queued(sub_session_id))
        } else {
            Ok(DispatchOutcome::Dispatched(sub_session_id))
        }
    }

    /// Release the busy lock taken by [`Self::dispatch`] once the bound
    /// sub-session's turn finishes.
    pub fn release(&self, id: AgentInstanceId) {
        self.state.lock().busy.remove(&id);
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.state.lock().history.iter().cloned().collect()
    }

    fn record(&self, state: &mut State<P>, instance_id: AgentInstanceId, kind: HistoryKind, reason: Option<String>) {
        let at_ms = self.clock.epoch_ms();
        if let Some(log) = &self.history_log {
            let agent_id = state.instances.get(&instance_id).map(|i| i.config_id.to_string()).unwrap_or_default();
            let entry = weave_storage::AgentHistoryEntry {
                agent_id,
                instance_id: instance_id.to_string(),
                kind: kind.into(),
                at_ms,
                detail: reason.clone(),
            };
            if let Err(e) = log.append(&entry) {
                tracing::warn!(error = %e, "failed to persist agent history entry");
            }
        }
        state.history.push_back(HistoryEntry { instance_id, kind, reason, at_ms });
        while state.history.len() > MAX_HISTORY_ENTRIES {
            state.history.pop_front();
        }
    }

    fn broadcast(&self, id: AgentInstanceId, state: AgentInstanceState) {
        self.events.publish(OutboundEvent::AgentUpdate { id, state });
    }
}

#[cfg(test)]
#[path = "agent_pool_tests.rs"]
mod tests;
