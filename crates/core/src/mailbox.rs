// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox entry types for the Message Hub's async result retrieval (§4.1).
//!
//! Every `send` creates a mailbox entry that transitions
//! `pending -> processing -> {completed | failed}`. Terminal states are
//! sticky (§3 invariants): once `completed` or `failed`, no further updates
//! are accepted.

use crate::module::ModuleId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a mailbox entry.
    pub struct MailboxEntryId("mbx-");
}

/// Lifecycle state of a mailbox entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailboxStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

crate::simple_display! {
    MailboxStatus {
        Pending => "pending",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
    }
}

impl MailboxStatus {
    /// Terminal states are sticky; no further updates are accepted once reached.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MailboxStatus::Completed | MailboxStatus::Failed)
    }

    /// Whether `self -> next` is a legal mailbox transition.
    pub fn can_transition_to(&self, next: MailboxStatus) -> bool {
        use MailboxStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Pending, Processing) | (Pending, Completed) | (Pending, Failed)
                | (Processing, Completed) | (Processing, Failed)
        )
    }
}

/// An entry tracking the in-flight or completed result of a `send` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxEntry {
    pub id: MailboxEntryId,
    /// Caller-supplied idempotency key, indexed for `getByCallbackId`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    pub target: ModuleId,
    pub status: MailboxStatus,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MailboxEntry {
    pub fn new(target: ModuleId, callback_id: Option<String>, now_ms: u64) -> Self {
        Self {
            id: MailboxEntryId::new(),
            callback_id,
            target,
            status: MailboxStatus::Pending,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            result: None,
            error: None,
        }
    }

    /// Apply a transition, returning `false` (no-op) if it would downgrade a
    /// terminal state (§3 invariant: "a mailbox entry never downgrades state").
    #[must_use]
    pub fn transition(&mut self, next: MailboxStatus, now_ms: u64) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at_ms = now_ms;
        true
    }

    pub fn complete(&mut self, result: serde_json::Value, now_ms: u64) -> bool {
        if self.transition(MailboxStatus::Completed, now_ms) {
            self.result = Some(result);
            true
        } else {
            false
        }
    }

    pub fn fail(&mut self, error: impl Into<String>, now_ms: u64) -> bool {
        if self.transition(MailboxStatus::Failed, now_ms) {
            self.error = Some(error.into());
            true
        } else {
            false
        }
    }
}

crate::builder! {
    pub struct MailboxEntryBuilder => MailboxEntry {
        set {
            id: MailboxEntryId = MailboxEntryId::new(),
            target: ModuleId = ModuleId::new(),
            status: MailboxStatus = MailboxStatus::Pending,
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
        option {
            callback_id: String = None,
            error: String = None,
        }
        computed {
            result: Option<serde_json::Value> = None,
        }
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
