// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SessionStore`: owns Sessions and caches Checkpoints (§3 Ownership —
//! "a workflow holds only `sessionId` and queries the store" / "Checkpoints
//! are owned by disk and cached by the SessionStore").
//!
//! Per §5's shared-resource policy, writes to *different* sessions never
//! block each other: each session gets its own `Mutex`, taken only for the
//! duration of applying one event to that session's in-memory copy. The
//! WAL append that makes the mutation durable is serialized through a
//! single log-wide lock (disk writes are ordered; that ordering is what the
//! sequence numbers in `WalEntry` record), but that lock is held only for
//! the `write`+`fsync` itself, never across an `.await` or while holding a
//! session lock.

use crate::error::StorageError;
use crate::event::SessionEvent;
use crate::paths::StateLayout;
use crate::snapshot::Snapshot;
use crate::state::MaterializedState;
use crate::wal::Wal;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use weave_core::{Checkpoint, Message, Session, SessionId, WorkflowId};

pub struct SessionStore {
    layout: StateLayout,
    wal: Mutex<Wal<SessionEvent>>,
    /// Snapshot + WAL-replay result, refreshed on every apply. Reads take a
    /// shared lock; per-session writes below take no lock on this at all
    /// except the brief swap after the per-session mutation is computed.
    state: RwLock<MaterializedState>,
    /// Per-session locks so concurrent writes to distinct sessions never
    /// contend (§5).
    session_locks: RwLock<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionStore {
    /// Open the store at `root`, replaying the newest snapshot plus any WAL
    /// entries written after it (§10.3 "restart replays the log... to reach
    /// the same state deterministically").
    pub fn open(root: impl Into<std::path::PathBuf>) -> Result<Self, StorageError> {
        let layout = StateLayout::new(root.into());
        let snapshot = Snapshot::load(layout.snapshot_path())?;
        let (mut state, after_seq) = match snapshot {
            Some(s) => (s.state, Some(s.wal_seq)),
            None => (MaterializedState::new(), None),
        };
        let replayed = Wal::<SessionEvent>::replay_after(layout.wal_path(), after_seq)?;
        for entry in &replayed {
            state.apply(&entry.event);
        }
        let wal = Wal::open(layout.wal_path())?;
        Ok(Self {
            layout,
            wal: Mutex::new(wal),
            state: RwLock::new(state),
            session_locks: RwLock::new(HashMap::new()),
        })
    }

    fn lock_for(&self, session_id: SessionId) -> Arc<Mutex<()>> {
        if let Some(lock) = self.session_locks.read().get(&session_id) {
            return lock.clone();
        }
        self.session_locks.write().entry(session_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Append `event` to the WAL, then apply it to the materialized state
    /// under that session's lock.
    fn commit(&self, event: SessionEvent) -> Result<(), StorageError> {
        let session_id = event.session_id();
        let lock = self.lock_for(session_id);
        let _guard = lock.lock();
        self.wal.lock().append(event.clone())?;
        self.state.write().apply(&event);
        Ok(())
    }

    pub fn create_session(&self, session: Session) -> Result<(), StorageError> {
        self.commit(SessionEvent::SessionCreated { session })
    }

    pub fn append_message(
        &self,
        session_id: SessionId,
        message: Message,
        at_ms: u64,
    ) -> Result<(), StorageError> {
        self.commit(SessionEvent::SessionMessageAppended { session_id, message, at_ms })
    }

    pub fn pause(&self, session_id: SessionId, at_ms: u64) -> Result<(), StorageError> {
        self.commit(SessionEvent::SessionPaused { session_id, at_ms })
    }

    pub fn resume(&self, session_id: SessionId, at_ms: u64) -> Result<(), StorageError> {
        self.commit(SessionEvent::SessionResumed { session_id, at_ms })
    }

    pub fn set_context(
        &self,
        session_id: SessionId,
        key: impl Into<String>,
        value: serde_json::Value,
        at_ms: u64,
    ) -> Result<(), StorageError> {
        self.commit(SessionEvent::SessionContextSet {
            session_id,
            key: key.into(),
            value,
            at_ms,
        })
    }

    pub fn link_workflow(
        &self,
        session_id: SessionId,
        workflow_id: WorkflowId,
        at_ms: u64,
    ) -> Result<(), StorageError> {
        self.commit(SessionEvent::WorkflowLinked { session_id, workflow_id, at_ms })
    }

    pub fn unlink_workflow(
        &self,
        session_id: SessionId,
        workflow_id: WorkflowId,
        at_ms: u64,
    ) -> Result<(), StorageError> {
        self.commit(SessionEvent::WorkflowUnlinked { session_id, workflow_id, at_ms })
    }

    /// Persist a checkpoint: both to the event-sourced cache (for fast
    /// lookup) and as a standalone JSON file (§6 "checkpoints/<id>.json")
    /// so a transport-side tool can read one off disk without going through
    /// the daemon.
    pub fn write_checkpoint(&self, project: &str, checkpoint: Checkpoint) -> Result<(), StorageError> {
        let path = self.layout.checkpoint_path(project, checkpoint.session_id, checkpoint.id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        let bytes =
            serde_json::to_vec_pretty(&checkpoint).map_err(|e| StorageError::serde("checkpoint", e))?;
        std::fs::write(&path, bytes).map_err(|e| StorageError::io(&path, e))?;
        self.commit(SessionEvent::CheckpointWritten { checkpoint })
    }

    pub fn get_session(&self, session_id: SessionId) -> Option<Session> {
        self.state.read().get_session(session_id).cloned()
    }

    pub fn checkpoints_for(&self, session_id: SessionId) -> Vec<Checkpoint> {
        self.state.read().checkpoints_for(session_id).to_vec()
    }

    /// Snapshot the current state, recording the WAL sequence it reflects
    /// (§10.3 "periodically compacted into a versioned JSON snapshot").
    pub fn compact(&self) -> Result<(), StorageError> {
        let wal_seq = {
            let wal = self.wal.lock();
            wal.next_seq().saturating_sub(1)
        };
        let state = self.state.read().clone();
        Snapshot::new(wal_seq, state).save(self.layout.snapshot_path())
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }
}

#[cfg(test)]
#[path = "session_store_tests.rs"]
mod tests;
