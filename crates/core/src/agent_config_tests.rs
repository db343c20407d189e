// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn builder_defaults_to_child_process_transport() {
    let cfg = AgentConfig::builder().name("coder").command("/bin/coder").build();
    assert_eq!(cfg.transport, AgentTransport::ChildProcess);
    assert_eq!(cfg.max_concurrency, 1);
}

#[test]
fn config_serde_round_trips() {
    let cfg = AgentConfig::builder().name("reviewer").command("/bin/reviewer").build();
    let json = serde_json::to_string(&cfg).unwrap();
    let back: AgentConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.id, cfg.id);
    assert_eq!(back.name, "reviewer");
}
