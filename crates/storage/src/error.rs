// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage-layer error taxonomy (§7; `Internal`/`Io`/`Parse` kinds only —
//! storage never originates a `Validation`/`Conflict`/`Timeout` error, those
//! belong to the subsystem that asked it to persist something).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error at {path:?}: {source}")]
    Io { path: std::path::PathBuf, #[source] source: std::io::Error },
    #[error("serialization error in {context}: {source}")]
    Serde { context: String, #[source] source: serde_json::Error },
    #[error("wal entry at offset {offset} is corrupt: {message}")]
    WalCorrupt { offset: u64, message: String },
    #[error("snapshot version {found} is newer than supported version {supported}")]
    UnsupportedSnapshotVersion { found: u32, supported: u32 },
    #[error("unknown session: {id}")]
    UnknownSession { id: String },
}

impl StorageError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io { path: path.as_ref().to_path_buf(), source }
    }

    pub fn serde(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serde { context: context.into(), source }
    }
}
