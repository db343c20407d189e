// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured logging setup (§10.1): an `EnvFilter` layer controlled by the
//! resolved `log_level`/`WEAVE_LOG`, mirrored to stderr and to a non-blocking
//! rotating file writer under the daemon's own state directory.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global subscriber. The returned [`WorkerGuard`] must be
/// held for the lifetime of the process — dropping it flushes and detaches
/// the background file-writer thread.
pub fn init(log_path: &std::path::Path, default_level: &str) -> std::io::Result<WorkerGuard> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file_name = log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("daemon.log"));
    let dir = log_path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env("WEAVE_LOG")
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.and(std::io::stderr))
        .with_target(true)
        .event_format(fmt::format().with_level(true))
        .init();

    Ok(guard)
}
