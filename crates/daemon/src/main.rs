// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `weaved`: entry point. Loads configuration, starts the runtime and the
//! Unix-socket listener, and waits for a shutdown signal (Ctrl-C or a
//! `Request::Shutdown` over the socket) before draining and exiting (§2, §6).

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{error, info};
use weave_daemon::config::Config;
use weave_daemon::error::DaemonError;
use weave_daemon::listener::{ListenCtx, Listener};
use weave_daemon::{lifecycle, logging, notifier};

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("weaved: failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Held for the process lifetime: dropping it stops the non-blocking
    // log writer from flushing.
    let _guard = match logging::init(&config.log_path, &config.log_level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("weaved: failed to initialize logging: {e}");
            std::process::exit(1);
        }
    };

    info!(state_dir = %config.state_dir.display(), "starting daemon");

    let start = lifecycle::startup(&config).await;
    let (daemon, listener) = match start {
        Ok(result) => (result.daemon, result.listener),
        Err(e @ DaemonError::BindFailed { .. }) => {
            error!(error = %e, "startup failed");
            std::process::exit(2);
        }
        Err(e) => {
            error!(error = %e, "startup failed");
            std::process::exit(1);
        }
    };

    if daemon.config.desktop_notifications {
        let events = daemon.runtime.subscribe();
        tokio::spawn(notifier::run(events, weave_adapters::DesktopNotifyAdapter::new()));
    }

    let shutdown = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx { daemon: tokio::sync::Mutex::new(daemon), config, shutdown: Arc::clone(&shutdown) });

    let listener_task = tokio::spawn(Listener::new(listener, Arc::clone(&ctx)).run());

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl-c, shutting down");
        }
        _ = shutdown.notified() => {
            info!("shutdown requested over socket");
        }
    }

    shutdown.notify_waiters();
    let drain_timeout = ctx.config.drain_timeout;
    if tokio::time::timeout(drain_timeout, listener_task).await.is_err() {
        error!("listener did not stop within the drain timeout");
    }

    let mut daemon = ctx.daemon.lock().await;
    if let Err(e) = daemon.shutdown() {
        error!(error = %e, "shutdown encountered an error");
        std::process::exit(1);
    }

    info!("daemon exited cleanly");
}
