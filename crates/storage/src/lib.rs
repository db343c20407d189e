// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! weave-storage: durable persistence for the orchestration runtime (§3
//! Ownership, §6 "Persisted state layout", §10.3).
//!
//! The engine crate owns Workflows, Tasks, Agent Instances, and Resources
//! in memory for the lifetime of the daemon process. This crate owns what
//! survives a restart: Sessions and the Checkpoints taken of a workflow's
//! progress, plus the two append-only bookkeeping logs (agent lifecycle
//! history, scheduler duration history) named in §4.4/§4.5.
//!
//! Session/checkpoint mutations are event-sourced: every write first becomes
//! a [`SessionEvent`] appended to a [`Wal`], then applied to the in-memory
//! [`state::MaterializedState`] — never the reverse — so a crash between
//! "decided" and "durable" cannot happen, and [`SessionStore::open`] recovers
//! by replaying the newest [`Snapshot`] plus any WAL entries written after it.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod event;
pub mod history;
pub mod paths;
pub mod session_store;
pub mod snapshot;
pub mod state;
pub mod wal;

pub use error::StorageError;
pub use event::SessionEvent;
pub use history::{AgentHistoryEntry, AgentHistoryKind, BoundedJsonlLog, SchedulerHistoryEntry};
pub use paths::StateLayout;
pub use session_store::SessionStore;
pub use snapshot::{Snapshot, CURRENT_SNAPSHOT_VERSION};
pub use state::MaterializedState;
pub use wal::{Wal, WalEntry};
