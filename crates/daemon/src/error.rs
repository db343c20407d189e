// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level error taxonomy.
//!
//! `weave-core::CoreError` and `weave-storage::StorageError` already aggregate
//! their own subsystems; the orphan rule keeps either crate from implementing
//! `From` for the other, so this enum is where the two (plus daemon-local I/O
//! and bind failures) meet.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("could not determine state directory")]
    NoStateDir,
    #[error("failed to acquire lock at {path}: daemon already running?")]
    LockFailed { path: std::path::PathBuf, #[source] source: std::io::Error },
    #[error("failed to bind socket at {path}: {source}")]
    BindFailed { path: std::path::PathBuf, #[source] source: std::io::Error },
    #[error(transparent)]
    Core(#[from] weave_core::CoreError),
    #[error(transparent)]
    Storage(#[from] weave_storage::StorageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}
