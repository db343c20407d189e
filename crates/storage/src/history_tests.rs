// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn entry(kind: AgentHistoryKind, at_ms: u64) -> AgentHistoryEntry {
    AgentHistoryEntry {
        agent_id: "agent-1".into(),
        instance_id: "agt-1".into(),
        kind,
        at_ms,
        detail: None,
    }
}

#[test]
fn tail_returns_all_entries_under_cap() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log: BoundedJsonlLog<AgentHistoryEntry> = BoundedJsonlLog::new(dir.path().join("h.jsonl"), 1000);
    log.append(&entry(AgentHistoryKind::Register, 1)).expect("append");
    log.append(&entry(AgentHistoryKind::Start, 2)).expect("append");
    let tailed = log.tail().expect("tail");
    assert_eq!(tailed.len(), 2);
}

#[test]
fn tail_drops_oldest_past_cap() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log: BoundedJsonlLog<AgentHistoryEntry> = BoundedJsonlLog::new(dir.path().join("h.jsonl"), 3);
    for i in 0..5u64 {
        log.append(&entry(AgentHistoryKind::HealthCheckFailed, i)).expect("append");
    }
    let tailed = log.tail().expect("tail");
    assert_eq!(tailed.len(), 3);
    assert_eq!(tailed[0].at_ms, 2);
    assert_eq!(tailed[2].at_ms, 4);
}

#[test]
fn compact_rewrites_file_to_bounded_length() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("h.jsonl");
    let log: BoundedJsonlLog<AgentHistoryEntry> = BoundedJsonlLog::new(&path, 2);
    for i in 0..5u64 {
        log.append(&entry(AgentHistoryKind::Crash, i)).expect("append");
    }
    log.compact().expect("compact");
    let reopened: BoundedJsonlLog<AgentHistoryEntry> = BoundedJsonlLog::new(&path, 1000);
    let tailed = reopened.tail().expect("tail");
    assert_eq!(tailed.len(), 2);
    assert_eq!(tailed[0].at_ms, 3);
}

#[test]
fn tail_on_missing_file_is_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log: BoundedJsonlLog<AgentHistoryEntry> = BoundedJsonlLog::new(dir.path().join("missing.jsonl"), 10);
    assert!(log.tail().expect("tail").is_empty());
}
