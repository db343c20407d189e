// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic compaction of the WAL into a versioned JSON snapshot (§10.3).
//!
//! A snapshot records the WAL sequence number it was taken at so recovery
//! only has to replay entries written after it, not the whole log since
//! the daemon was first installed. Writes are atomic: the snapshot is
//! written to a sibling `.tmp` file and renamed into place, so a crash
//! mid-write leaves the previous snapshot intact.

use crate::error::StorageError;
use crate::state::MaterializedState;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub wal_seq: u64,
    pub state: MaterializedState,
}

impl Snapshot {
    pub fn new(wal_seq: u64, state: MaterializedState) -> Self {
        Self { version: CURRENT_SNAPSHOT_VERSION, wal_seq, state }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(path, e))?;
        }
        let tmp = path.with_extension("tmp");
        let bytes =
            serde_json::to_vec_pretty(self).map_err(|e| StorageError::serde("snapshot", e))?;
        std::fs::write(&tmp, bytes).map_err(|e| StorageError::io(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| StorageError::io(path, e))?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>, StorageError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(path).map_err(|e| StorageError::io(path, e))?;
        let snapshot: Snapshot =
            serde_json::from_slice(&bytes).map_err(|e| StorageError::serde("snapshot", e))?;
        if snapshot.version > CURRENT_SNAPSHOT_VERSION {
            return Err(StorageError::UnsupportedSnapshotVersion {
                found: snapshot.version,
                supported: CURRENT_SNAPSHOT_VERSION,
            });
        }
        Ok(Some(snapshot))
    }
}
