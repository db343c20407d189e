// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource pool accounting for the concurrency scheduler (§3, §4.5).
//!
//! Each [`Resource`] tracks a named, capped quantity (CPU slots, memory MB,
//! named agent-config concurrency lanes...) that the scheduler admits tasks
//! against. Exhaustion degrades gracefully (§4.5 "degradation") rather than
//! erroring.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a resource pool entry.
    pub struct ResourceId("res-");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub in_use: u32,
}

impl Resource {
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self { id: ResourceId::new(), name: name.into(), in_use: 0, capacity }
    }

    pub fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.in_use)
    }

    pub fn is_exhausted(&self) -> bool {
        self.available() == 0
    }

    /// Reserve `amount` units, returning `false` without mutating state if
    /// capacity is insufficient.
    #[must_use]
    pub fn acquire(&mut self, amount: u32) -> bool {
        if self.available() < amount {
            return false;
        }
        self.in_use += amount;
        true
    }

    /// Release `amount` units, clamped so it can never drop `in_use` below zero.
    pub fn release(&mut self, amount: u32) {
        self.in_use = self.in_use.saturating_sub(amount);
    }

    /// Fraction of capacity currently reserved, in `[0.0, 1.0]`.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 1.0;
        }
        f64::from(self.in_use) / f64::from(self.capacity)
    }
}

crate::builder! {
    pub struct ResourceBuilder => Resource {
        set {
            id: ResourceId = ResourceId::new(),
            capacity: u32 = 1,
            in_use: u32 = 0,
        }
        into {
            name: String = "cpu",
        }
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
