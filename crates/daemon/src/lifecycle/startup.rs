// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup sequence (§2 Process shape, §6 persisted state layout).

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use tokio::net::UnixListener;
use tracing::{info, warn};
use weave_adapters::{HttpHealthChecker, StdChildProcessAdapter};
use weave_core::{AgentConfig, SystemClock};
use weave_engine::scheduler::SchedulerConfig;
use weave_storage::SessionStore;

use super::{DaemonRuntime, DaemonState, StartupResult};
use crate::config::Config;
use crate::error::DaemonError;

pub async fn startup(config: &Config) -> Result<StartupResult, DaemonError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            if !matches!(e, DaemonError::LockFailed { .. }) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, DaemonError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Acquire the single-instance lock before anything else so two daemons
    // racing for the same state directory fail fast rather than corrupting it.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(|e| DaemonError::LockFailed { path: config.lock_path.clone(), source: e })?;
    lock_file.set_len(0)?;
    { let mut f = &lock_file; writeln!(f, "{}", std::process::id())?; }

    let session_store = Arc::new(SessionStore::open(&config.state_dir)?);
    info!(state_dir = %config.state_dir.display(), "opened session store");

    let runtime: Arc<DaemonRuntime> = Arc::new(weave_engine::Runtime::new(
        SystemClock,
        StdChildProcessAdapter,
        HttpHealthChecker,
        SchedulerConfig::default(),
    ));

    for agent_config in load_agent_configs(&config.state_dir) {
        if let Err(e) = runtime.agent_pool.register_config(agent_config) {
            warn!(error = %e, "failed to register agent config from config/agents.json");
        }
    }

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| DaemonError::BindFailed { path: config.socket_path.clone(), source: e })?;

    info!("daemon started");

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            runtime,
            session_store,
            start_time: Instant::now(),
        },
        listener,
    })
}

/// Load the array of agent configs at `<state_dir>/config/agents.json`
/// (§6 persisted state layout). Absence is not an error — a freshly
/// initialized daemon simply starts with no agents registered.
fn load_agent_configs(state_dir: &std::path::Path) -> Vec<AgentConfig> {
    let path = state_dir.join("config").join("agents.json");
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring malformed agents.json");
            Vec::new()
        }),
        Err(_) => Vec::new(),
    }
}

fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}
