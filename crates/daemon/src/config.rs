// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered daemon configuration (§10.3): compiled-in defaults, then an
//! optional TOML file, then individual env-var overrides for operational
//! knobs. State-directory resolution follows the same fallback chain as the
//! rest of this module (`WEAVE_STATE_DIR` > `XDG_STATE_HOME` > `$HOME`).

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::DaemonError;

pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

fn default_ipc_timeout_ms() -> u64 {
    5_000
}

fn default_drain_timeout_ms() -> u64 {
    5_000
}

fn default_health_check_interval_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_desktop_notifications() -> bool {
    true
}

/// On-disk config file shape, every field optional so a partial file only
/// overrides what it names (§10.3 "compiled-in defaults, then a TOML file").
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    ipc_timeout_ms: Option<u64>,
    drain_timeout_ms: Option<u64>,
    health_check_interval_ms: Option<u64>,
    log_level: Option<String>,
    desktop_notifications: Option<bool>,
}

/// Fully resolved daemon configuration and the paths it runs against.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
    pub ipc_timeout: Duration,
    pub drain_timeout: Duration,
    pub health_check_interval_ms: u64,
    pub log_level: String,
    pub desktop_notifications: bool,
}

impl Config {
    /// Resolve the layered configuration for the user-level daemon. One
    /// daemon process serves every session for the invoking user.
    pub fn load() -> Result<Self, DaemonError> {
        let state_dir = state_dir()?;
        let file = load_file_config(&state_dir);

        let ipc_timeout_ms = std::env::var("WEAVE_IPC_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .or(file.ipc_timeout_ms)
            .unwrap_or_else(default_ipc_timeout_ms);

        let drain_timeout_ms = std::env::var("WEAVE_DRAIN_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .or(file.drain_timeout_ms)
            .unwrap_or_else(default_drain_timeout_ms);

        let health_check_interval_ms = std::env::var("WEAVE_HEALTH_CHECK_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .or(file.health_check_interval_ms)
            .unwrap_or_else(default_health_check_interval_ms);

        let log_level = std::env::var("WEAVE_LOG")
            .ok()
            .or(file.log_level)
            .unwrap_or_else(default_log_level);

        let desktop_notifications = std::env::var("WEAVE_DESKTOP_NOTIFICATIONS")
            .ok()
            .and_then(|s| match s.as_str() {
                "0" | "false" | "off" => Some(false),
                "1" | "true" | "on" => Some(true),
                _ => None,
            })
            .or(file.desktop_notifications)
            .unwrap_or_else(default_desktop_notifications);

        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            ipc_timeout: Duration::from_millis(ipc_timeout_ms),
            drain_timeout: Duration::from_millis(drain_timeout_ms),
            health_check_interval_ms,
            log_level,
            desktop_notifications,
            state_dir,
        })
    }
}

fn load_file_config(state_dir: &std::path::Path) -> FileConfig {
    let path = std::env::var("WEAVE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir.join("config").join("daemon.toml"));
    match std::fs::read_to_string(&path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            FileConfig::default()
        }),
        Err(_) => FileConfig::default(),
    }
}

/// Resolve the state directory: `WEAVE_STATE_DIR` > `XDG_STATE_HOME/weave` >
/// `~/.local/state/weave`.
pub fn state_dir() -> Result<PathBuf, DaemonError> {
    if let Ok(dir) = std::env::var("WEAVE_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = dirs::state_dir() {
        return Ok(xdg.join("weave"));
    }
    let home = dirs::home_dir().ok_or(DaemonError::NoStateDir)?;
    Ok(home.join(".local/state/weave"))
}
