// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSONL bookkeeping logs, tailed to a bounded length on load
//! (§4.4 "persisted as JSONL; tail at most 1000 entries retained", §4.5's
//! scheduler duration-history table).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Entry kinds recorded in an agent's lifecycle history (§4.4 Persistence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentHistoryKind {
    Register,
    Start,
    Stop,
    Restart,
    Crash,
    HealthCheckFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentHistoryEntry {
    pub agent_id: String,
    pub instance_id: String,
    pub kind: AgentHistoryKind,
    pub at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// One sample in the scheduler's duration-history table (§4.5 "adaptive" —
/// weighted average of historical average duration and the static estimate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerHistoryEntry {
    pub task_type: String,
    pub duration_ms: u64,
    pub success: bool,
    pub at_ms: u64,
}

/// An append-only JSONL log, read back with only the last `cap` entries
/// retained in memory (§4.4's "tail at most 1000 entries").
pub struct BoundedJsonlLog<T> {
    path: PathBuf,
    cap: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> BoundedJsonlLog<T> {
    pub fn new(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self { path: path.into(), cap, _marker: std::marker::PhantomData }
    }

    pub fn append(&self, entry: &T) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(&self.path, e))?;
        }
        let mut line =
            serde_json::to_string(entry).map_err(|e| StorageError::serde("history entry", e))?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StorageError::io(&self.path, e))?;
        file.write_all(line.as_bytes()).map_err(|e| StorageError::io(&self.path, e))?;
        file.sync_data().map_err(|e| StorageError::io(&self.path, e))?;
        Ok(())
    }

    /// Read the file back, keeping only the newest `cap` entries.
    pub fn tail(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.path).map_err(|e| StorageError::io(&self.path, e))?;
        let mut all = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| StorageError::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            all.push(
                serde_json::from_str(&line).map_err(|e| StorageError::serde("history entry", e))?,
            );
        }
        if all.len() > self.cap {
            let excess = all.len() - self.cap;
            all.drain(0..excess);
        }
        Ok(all)
    }

    /// Rewrite the file with only the newest `cap` entries, dropping the
    /// rest from disk — called periodically so the file itself stays bounded
    /// rather than only the in-memory view.
    pub fn compact(&self) -> Result<(), StorageError> {
        let tailed = self.tail()?;
        let tmp = self.path.with_extension("jsonl.tmp");
        let mut buf = String::new();
        for entry in &tailed {
            buf.push_str(
                &serde_json::to_string(entry).map_err(|e| StorageError::serde("history entry", e))?,
            );
            buf.push('\n');
        }
        std::fs::write(&tmp, buf).map_err(|e| StorageError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StorageError::io(&self.path, e))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
