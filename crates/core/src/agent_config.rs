// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static agent configuration (§3, §4.4).
//!
//! An `AgentConfig` describes how to spawn an agent of a given kind; the
//! Agent Pool keeps a registry of configs and instantiates [`AgentInstance`](crate::agent_instance::AgentInstance)s
//! against them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

crate::define_id! {
    /// Unique identifier for a registered agent configuration.
    pub struct AgentConfigId("acf-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentTransport {
    /// Supervised local child process communicating over stdio or HTTP.
    ChildProcess,
    /// In-process agent invoked as a Rust function/trait object.
    InProcess,
}

crate::simple_display! {
    AgentTransport {
        ChildProcess => "child_process",
        InProcess => "in_process",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: AgentConfigId,
    pub name: String,
    pub transport: AgentTransport,
    /// Executable path or in-process handler key, depending on `transport`.
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Maximum concurrently running instances of this config (§4.5 admission).
    pub max_concurrency: u32,
    /// Health-check interval, in milliseconds (§4.4).
    pub health_check_interval_ms: u64,
    /// Backoff base for restart attempts, in milliseconds.
    pub restart_backoff_base_ms: u64,
    pub max_restart_attempts: u32,
}

crate::builder! {
    pub struct AgentConfigBuilder => AgentConfig {
        set {
            id: AgentConfigId = AgentConfigId::new(),
            transport: AgentTransport = AgentTransport::ChildProcess,
            args: Vec<String> = Vec::new(),
            env: BTreeMap<String, String> = BTreeMap::new(),
            max_concurrency: u32 = 1,
            health_check_interval_ms: u64 = 10_000,
            restart_backoff_base_ms: u64 = 500,
            max_restart_attempts: u32 = 5,
        }
        into {
            name: String = "agent",
            command: String = "true",
        }
    }
}

#[cfg(test)]
#[path = "agent_config_tests.rs"]
mod tests;
