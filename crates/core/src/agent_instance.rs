// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent instance lifecycle (§3, §4.4).
//!
//! `registered -> starting -> running -> { stopping -> stopped | crashed }`,
//! with `crashed` retried via backoff up to a config's `max_restart_attempts`
//! before settling into `failed`.

use crate::agent_config::AgentConfigId;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a running (or once-running) agent instance.
    pub struct AgentInstanceId("agt-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentInstanceState {
    Registered,
    Starting,
    Running,
    Stopping,
    Stopped,
    Crashed,
    Failed,
}

crate::simple_display! {
    AgentInstanceState {
        Registered => "registered",
        Starting => "starting",
        Running => "running",
        Stopping => "stopping",
        Stopped => "stopped",
        Crashed => "crashed",
        Failed => "failed",
    }
}

impl AgentInstanceState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentInstanceState::Stopped | AgentInstanceState::Failed)
    }

    pub fn can_transition_to(&self, next: AgentInstanceState) -> bool {
        use AgentInstanceState::*;
        matches!(
            (self, next),
            (Registered, Starting)
                | (Starting, Running)
                | (Starting, Crashed)
                | (Running, Stopping)
                | (Running, Crashed)
                | (Stopping, Stopped)
                | (Crashed, Starting)
                | (Crashed, Failed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInstance {
    pub id: AgentInstanceId,
    pub config_id: AgentConfigId,
    pub state: AgentInstanceState,
    /// The sub-session this instance is currently bound to, if dispatched (§4.4).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub restart_count: u32,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat_at_ms: Option<u64>,
}

impl AgentInstance {
    pub fn new(config_id: AgentConfigId, now_ms: u64) -> Self {
        Self {
            id: AgentInstanceId::new(),
            config_id,
            state: AgentInstanceState::Registered,
            bound_session_id: None,
            pid: None,
            restart_count: 0,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            last_heartbeat_at_ms: None,
        }
    }

    #[must_use]
    pub fn transition(&mut self, next: AgentInstanceState, now_ms: u64) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        self.updated_at_ms = now_ms;
        true
    }

    pub fn record_heartbeat(&mut self, now_ms: u64) {
        self.last_heartbeat_at_ms = Some(now_ms);
    }

    pub fn bind_session(&mut self, session_id: SessionId) {
        self.bound_session_id = Some(session_id);
    }
}

crate::builder! {
    pub struct AgentInstanceBuilder => AgentInstance {
        set {
            id: AgentInstanceId = AgentInstanceId::new(),
            config_id: AgentConfigId = AgentConfigId::new(),
            state: AgentInstanceState = AgentInstanceState::Registered,
            restart_count: u32 = 0,
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
        option {
            bound_session_id: SessionId = None,
            pid: u32 = None,
            last_heartbeat_at_ms: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "agent_instance_tests.rs"]
mod tests;
