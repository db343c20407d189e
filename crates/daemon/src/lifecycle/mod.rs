// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, the shared running state, and shutdown.

mod startup;
pub use startup::startup;

use std::fs::File;
use std::sync::Arc;
use std::time::Instant;

use tokio::net::UnixListener;
use tracing::{info, warn};
use weave_adapters::{HttpHealthChecker, StdChildProcessAdapter};
use weave_core::SystemClock;
use weave_engine::Runtime;
use weave_storage::SessionStore;

use crate::config::Config;
use crate::error::DaemonError;

/// Concrete runtime type this daemon wires up: the real clock, a supervised
/// child-process adapter, and an HTTP health checker (§4.4).
pub type DaemonRuntime = Runtime<SystemClock, StdChildProcessAdapter, HttpHealthChecker>;

/// Everything the listener needs once startup has completed.
pub struct DaemonState {
    pub config: Config,
    // Held only to keep the exclusive file lock alive; released on drop.
    #[allow(dead_code)]
    lock_file: File,
    pub runtime: Arc<DaemonRuntime>,
    pub session_store: Arc<SessionStore>,
    pub start_time: Instant,
}

pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
}

impl DaemonState {
    /// Release the socket, lock file, and compact durable state. Agent
    /// processes are intentionally left running across a daemon restart —
    /// there is no per-agent breadcrumb scheme here to reconnect them with,
    /// so a future revision that needs that will add one.
    pub fn shutdown(&mut self) -> Result<(), DaemonError> {
        info!("shutting down daemon");

        if let Err(e) = self.session_store.compact() {
            warn!(error = %e, "failed to compact session store on shutdown");
        }

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!(error = %e, "failed to remove socket file");
            }
        }
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!(error = %e, "failed to remove lock file");
            }
        }

        info!("daemon shutdown complete");
        Ok(())
    }
}
