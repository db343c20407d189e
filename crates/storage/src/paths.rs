// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path layout for persisted state (§6 "Persisted state layout" — abstract
//! paths, language-independent; actual root is configurable).

use std::path::{Path, PathBuf};
use weave_core::{CheckpointId, SessionId};

/// Resolves every on-disk path the daemon writes, rooted at a configurable
/// state directory (§10.3's layered config resolves this root).
#[derive(Debug, Clone)]
pub struct StateLayout {
    root: PathBuf,
}

impl StateLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn agents_config_path(&self) -> PathBuf {
        self.config_dir().join("agents.json")
    }

    pub fn inputs_config_path(&self) -> PathBuf {
        self.config_dir().join("inputs.yaml")
    }

    pub fn outputs_config_path(&self) -> PathBuf {
        self.config_dir().join("outputs.yaml")
    }

    pub fn routes_config_path(&self) -> PathBuf {
        self.config_dir().join("routes.yaml")
    }

    pub fn session_dir(&self, project: &str, session_id: SessionId) -> PathBuf {
        self.root.join("sessions").join(project).join(session_id.to_string())
    }

    pub fn session_state_path(&self, project: &str, session_id: SessionId) -> PathBuf {
        self.session_dir(project, session_id).join("session-state.json")
    }

    pub fn checkpoint_path(
        &self,
        project: &str,
        session_id: SessionId,
        checkpoint_id: CheckpointId,
    ) -> PathBuf {
        self.session_dir(project, session_id)
            .join("checkpoints")
            .join(format!("{checkpoint_id}.json"))
    }

    pub fn agent_pid_path(&self, agent_id: &str) -> PathBuf {
        self.root.join("agents").join(format!("{agent_id}.pid"))
    }

    pub fn agent_log_path(&self, agent_id: &str) -> PathBuf {
        self.root.join("agents").join(format!("{agent_id}.log"))
    }

    pub fn agent_history_path(&self) -> PathBuf {
        self.root.join("agent-history.json")
    }

    pub fn scheduler_history_path(&self) -> PathBuf {
        self.root.join("scheduler-history.json")
    }

    pub fn session_log_path(&self, session_id: SessionId) -> PathBuf {
        self.root.join("logs").join(format!("{session_id}.jsonl"))
    }

    pub fn wal_path(&self) -> PathBuf {
        self.root.join("sessions.wal")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join("sessions.snapshot.json")
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
