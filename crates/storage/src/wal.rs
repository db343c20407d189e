// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log (§10.3).
//!
//! One line of JSON per entry, `fsync`'d before `append` returns so a
//! crash immediately after can never lose an acknowledged write. Entries
//! are tagged with a monotonically increasing sequence number so a
//! [`crate::snapshot::Snapshot`] can record "everything up to seq N is
//! already folded in" and replay can skip ahead.

use crate::error::StorageError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry<E> {
    pub seq: u64,
    pub event: E,
}

/// An append-only log of events of type `E`, one JSON object per line.
pub struct Wal<E> {
    path: PathBuf,
    file: File,
    next_seq: u64,
    _marker: std::marker::PhantomData<E>,
}

impl<E: Serialize + DeserializeOwned> Wal<E> {
    /// Open (creating if absent) the log at `path` and determine the next
    /// sequence number by reading the last line already on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(&path, e))?;
        }
        let next_seq = Self::last_seq(&path)?.map(|s| s + 1).unwrap_or(0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;
        Ok(Self { path, file, next_seq, _marker: std::marker::PhantomData })
    }

    fn last_seq(path: &Path) -> Result<Option<u64>, StorageError> {
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
        let mut last = None;
        for (offset, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| StorageError::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: WalEntry<E> = serde_json::from_str(&line).map_err(|_| {
                StorageError::WalCorrupt { offset: offset as u64, message: "unparseable entry".into() }
            })?;
            last = Some(entry.seq);
        }
        Ok(last)
    }

    /// Append `event`, `fsync`, and return the sequence number it was
    /// recorded under.
    pub fn append(&mut self, event: E) -> Result<u64, StorageError> {
        let seq = self.next_seq;
        let entry = WalEntry { seq, event };
        let mut line = serde_json::to_string(&entry)
            .map_err(|e| StorageError::serde("wal entry", e))?;
        line.push('\n');
        self.file.write_all(line.as_bytes()).map_err(|e| StorageError::io(&self.path, e))?;
        self.file.sync_data().map_err(|e| StorageError::io(&self.path, e))?;
        self.next_seq += 1;
        Ok(seq)
    }

    /// Replay every entry with `seq > after_seq`, in order, oldest first.
    pub fn replay_after(
        path: impl AsRef<Path>,
        after_seq: Option<u64>,
    ) -> Result<Vec<WalEntry<E>>, StorageError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
        let mut out = Vec::new();
        for (offset, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| StorageError::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: WalEntry<E> = serde_json::from_str(&line).map_err(|_| {
                StorageError::WalCorrupt { offset: offset as u64, message: "unparseable entry".into() }
            })?;
            let keep = match after_seq {
                Some(after) => entry.seq > after,
                None => true,
            };
            if keep {
                out.push(entry);
            }
        }
        Ok(out)
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
