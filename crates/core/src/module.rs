// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module registry types (§4.1).
//!
//! A `Module` is a named handler the Message Hub can address: an input
//! source, an output sink, or an agent. Handlers themselves are sealed,
//! non-duck-typed capabilities defined in `weave-engine`'s hub module
//! (`InputHandler`/`OutputHandler` traits); this type only carries the
//! registry-visible metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

crate::define_id! {
    /// Unique identifier for a registered module.
    pub struct ModuleId("mod-");
}

/// What kind of handler a module provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Input,
    Output,
    Agent,
}

crate::simple_display! {
    ModuleKind {
        Input => "input",
        Output => "output",
        Agent => "agent",
    }
}

/// Registered module metadata, owned by the Message Hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub kind: ModuleKind,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    #[serde(default)]
    pub metadata: std::collections::BTreeMap<String, String>,
}

impl Module {
    pub fn new(id: ModuleId, kind: ModuleKind) -> Self {
        Self { id, kind, capabilities: BTreeSet::new(), metadata: Default::default() }
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = String>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }
}

crate::builder! {
    pub struct ModuleBuilder => Module {
        set {
            id: ModuleId = ModuleId::new(),
            kind: ModuleKind = ModuleKind::Agent,
            capabilities: BTreeSet<String> = BTreeSet::new(),
            metadata: std::collections::BTreeMap<String, String> = Default::default(),
        }
    }
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
