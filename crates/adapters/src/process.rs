// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-process spawning for `AgentTransport::ChildProcess` agents (§4.4).
//!
//! `start` redirects stdout/stderr to an append log file, writes a pid file,
//! and populates `AGENT_ID`/`AGENT_PORT` in the child's environment. `stop`
//! sends `SIGTERM` and escalates to `SIGKILL` after a 5s grace period — the
//! engine's Agent Pool owns the decision of *when* to stop; this adapter only
//! owns *how*.

use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};

/// Grace period between `SIGTERM` and `SIGKILL` escalation (§4.4, §5 Cancellation).
pub const STOP_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn {command}: {message}")]
    SpawnFailed { command: String, message: String },
    #[error("failed to open log file {path}: {message}")]
    LogOpenFailed { path: PathBuf, message: String },
    #[error("failed to write pid file {path}: {message}")]
    PidFileFailed { path: PathBuf, message: String },
    #[error("process {pid} not found")]
    NotFound { pid: u32 },
    #[error("signal delivery to {pid} failed: {message}")]
    SignalFailed { pid: u32, message: String },
}

/// What to spawn and where to put its bookkeeping files.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub agent_id: String,
    pub agent_port: u16,
    pub log_path: PathBuf,
    pub pid_path: PathBuf,
}

/// A live (or recently-live) child process.
pub struct ProcessHandle {
    pub pid: u32,
    child: Option<Child>,
}

impl ProcessHandle {
    /// Whether the OS still reports this pid as alive. Uses `kill(pid, 0)`,
    /// which delivers no signal but fails with `ESRCH` if the process is gone.
    pub fn is_alive(&self) -> bool {
        signal::kill(Pid::from_raw(self.pid as i32), None).is_ok()
    }

    /// Non-blocking check for exit; `Some(code)` once the child has exited.
    /// `None` for a handle that never owned a `Child` (e.g. reattached from a
    /// pid file after a daemon restart).
    pub fn try_wait_exit_code(&mut self) -> Option<i32> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(Some(status)) => Some(status.code().unwrap_or(-1)),
            _ => None,
        }
    }
}

/// Spawns and supervises `AgentTransport::ChildProcess` agents (§4.4 `start`/`stop`).
#[async_trait]
pub trait ProcessAdapter: Send + Sync + 'static {
    async fn spawn(&self, spec: &SpawnSpec) -> Result<ProcessHandle, ProcessError>;

    /// Send `SIGTERM`, wait up to [`STOP_GRACE`], then `SIGKILL` if still alive.
    async fn stop(&self, handle: &mut ProcessHandle) -> Result<(), ProcessError> {
        signal::kill(Pid::from_raw(handle.pid as i32), Signal::SIGTERM)
            .map_err(|e| ProcessError::SignalFailed { pid: handle.pid, message: e.to_string() })?;

        let deadline = tokio::time::Instant::now() + STOP_GRACE;
        while tokio::time::Instant::now() < deadline {
            if !handle.is_alive() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if handle.is_alive() {
            signal::kill(Pid::from_raw(handle.pid as i32), Signal::SIGKILL)
                .map_err(|e| ProcessError::SignalFailed { pid: handle.pid, message: e.to_string() })?;
        }
        Ok(())
    }
}

/// Real `std`/`tokio` child-process adapter.
#[derive(Debug, Clone, Default)]
pub struct StdChildProcessAdapter;

#[async_trait]
impl ProcessAdapter for StdChildProcessAdapter {
    async fn spawn(&self, spec: &SpawnSpec) -> Result<ProcessHandle, ProcessError> {
        let stdout_log = OpenOptions::new().create(true).append(true).open(&spec.log_path).map_err(
            |e| ProcessError::LogOpenFailed { path: spec.log_path.clone(), message: e.to_string() },
        )?;
        let stderr_log = stdout_log
            .try_clone()
            .map_err(|e| ProcessError::LogOpenFailed { path: spec.log_path.clone(), message: e.to_string() })?;

        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args)
            .env("AGENT_ID", &spec.agent_id)
            .env("AGENT_PORT", spec.agent_port.to_string())
            .envs(&spec.env)
            .stdout(stdout_log)
            .stderr(stderr_log);

        let child = cmd.spawn().map_err(|e| ProcessError::SpawnFailed {
            command: spec.command.clone(),
            message: e.to_string(),
        })?;
        let pid = child.id().ok_or_else(|| ProcessError::SpawnFailed {
            command: spec.command.clone(),
            message: "child exited before pid could be read".into(),
        })?;

        std::fs::write(&spec.pid_path, pid.to_string())
            .map_err(|e| ProcessError::PidFileFailed { path: spec.pid_path.clone(), message: e.to_string() })?;

        Ok(ProcessHandle { pid, child: Some(child) })
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// In-memory process adapter: "spawns" nothing, just hands out synthetic
    /// pids and records calls, so pool/scheduler tests don't touch the OS.
    #[derive(Clone, Default)]
    pub struct FakeProcessAdapter {
        next_pid: Arc<AtomicU32>,
        alive: Arc<Mutex<std::collections::HashSet<u32>>>,
        spawns: Arc<Mutex<Vec<SpawnSpec>>>,
    }

    impl FakeProcessAdapter {
        pub fn new() -> Self {
            Self { next_pid: Arc::new(AtomicU32::new(1000)), ..Default::default() }
        }

        pub fn spawns(&self) -> Vec<SpawnSpec> {
            self.spawns.lock().clone()
        }

        pub fn kill(&self, pid: u32) {
            self.alive.lock().remove(&pid);
        }

        pub fn is_alive(&self, pid: u32) -> bool {
            self.alive.lock().contains(&pid)
        }
    }

    #[async_trait]
    impl ProcessAdapter for FakeProcessAdapter {
        async fn spawn(&self, spec: &SpawnSpec) -> Result<ProcessHandle, ProcessError> {
            let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
            self.alive.lock().insert(pid);
            self.spawns.lock().push(spec.clone());
            Ok(ProcessHandle { pid, child: None })
        }

        async fn stop(&self, handle: &mut ProcessHandle) -> Result<(), ProcessError> {
            self.alive.lock().remove(&handle.pid);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeProcessAdapter;

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
