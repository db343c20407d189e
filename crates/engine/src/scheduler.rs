// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrency Scheduler & Resource Pool (§4.5): admit or defer task
//! dispatches based on available resources, estimated payoff, and
//! global/per-type concurrency caps.
//!
//! The resource pool itself mutates are exclusive (single-writer, §5
//! Shared-resource policy) — every method here takes the pool's
//! [`parking_lot::Mutex`] briefly and releases it before any `await` point.
//! The only I/O this module performs is the optional duration-history JSONL
//! append in [`ConcurrencyScheduler::complete_task`] (§4.5 Persistence).

use parking_lot::Mutex;
use std::collections::HashMap;
use weave_core::{Clock, Resource, SchedulerError, TaskId};
use weave_storage::BoundedJsonlLog;

/// A single resource requirement a task declares for admission (§4.5 step 1).
#[derive(Debug, Clone)]
pub struct ResourceRequirement {
    pub resource_name: String,
    pub min_level: u32,
}

impl ResourceRequirement {
    pub fn new(resource_name: impl Into<String>, min_level: u32) -> Self {
        Self { resource_name: resource_name.into(), min_level }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEstimateMode {
    Static,
    Adaptive,
    LlmEstimate,
}

/// Tunables for the evaluation pipeline (§4.5); all named after their spec terms.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub global_max_concurrency: u32,
    pub degraded_max_concurrency: u32,
    /// Busy/total resource ratio above which the scheduler enters degraded mode.
    pub resource_usage_threshold: f64,
    /// Whether degraded mode denies all new admissions outright.
    pub pause_new_dispatches: bool,
    pub scheduling_overhead_ms: u64,
    /// Weight given to historical average duration once ≥3 samples exist.
    pub adaptive_history_weight: f64,
    pub aging_rate_ms: u64,
    pub time_estimate_mode: TimeEstimateMode,
    /// `static`/`llm_estimate` fallback durations keyed by inferred task type.
    pub static_estimates_ms: HashMap<String, u64>,
    pub llm_estimate_ms: u64,
    /// Per-inferred-type concurrency caps, checked alongside the global cap.
    pub per_type_max_concurrency: HashMap<String, u32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            global_max_concurrency: 8,
            degraded_max_concurrency: 2,
            resource_usage_threshold: 0.85,
            pause_new_dispatches: false,
            scheduling_overhead_ms: 250,
            adaptive_history_weight: 0.7,
            aging_rate_ms: 5_000,
            time_estimate_mode: TimeEstimateMode::Adaptive,
            static_estimates_ms: HashMap::new(),
            llm_estimate_ms: 10_000,
            per_type_max_concurrency: HashMap::new(),
        }
    }
}

/// Keyword table for `inferTaskType(description)` (§4.5 step 4).
const TASK_TYPE_KEYWORDS: &[(&str, &str)] =
    &[("test", "test"), ("build", "build"), ("deploy", "deploy"), ("review", "review"), ("research", "research")];

/// Infer a coarse task type from its description by keyword match, falling
/// back to `"general"` when nothing matches.
pub fn infer_task_type(description: &str) -> String {
    let lower = description.to_lowercase();
    for (keyword, task_type) in TASK_TYPE_KEYWORDS {
        if lower.contains(keyword) {
            return (*task_type).to_string();
        }
    }
    "general".to_string()
}

#[derive(Debug, Clone, Default)]
struct TaskHistory {
    avg_duration_ms: f64,
    success_rate: f64,
    sample_count: u32,
}

#[derive(Debug, Clone)]
struct QueuedTask {
    task_id: TaskId,
    description: String,
    requirements: Vec<ResourceRequirement>,
    base_priority: i64,
    enqueued_at_ms: u64,
}

#[derive(Debug, Clone)]
struct ActiveTask {
    task_type: String,
    resources: Vec<(String, u32)>,
    started_at_ms: u64,
    enqueued_at_ms: u64,
}

/// Outcome of [`ConcurrencyScheduler::evaluate_scheduling`] on admission (§4.5 step 6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulingDecision {
    pub estimated_start_time_ms: u64,
    pub estimated_duration_ms: u64,
    pub benefit_score: f64,
}

/// Named, capped resource quantities the scheduler admits tasks against
/// (§4.5 Resource Pool). A thin, synchronous wrapper over [`Resource`]
/// lookups; all mutation happens through [`ConcurrencyScheduler`] so pool
/// state and degradation tracking never drift apart.
#[derive(Debug, Clone, Default)]
pub struct ResourcePool {
    resources: HashMap<String, Resource>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, capacity: u32) {
        let resource = Resource::new(name, capacity);
        self.resources.insert(resource.name.clone(), resource);
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Resource> {
        self.resources.get_mut(name)
    }

    pub fn values(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn total_capacity(&self) -> u32 {
        self.resources.values().map(|r| r.capacity).sum()
    }

    pub fn total_in_use(&self) -> u32 {
        self.resources.values().map(|r| r.in_use).sum()
    }
}

struct State {
    pool: ResourcePool,
    queue: Vec<QueuedTask>,
    active: HashMap<TaskId, ActiveTask>,
    history: HashMap<String, TaskHistory>,
    degraded: bool,
}

pub struct ConcurrencyScheduler<C: Clock> {
    clock: C,
    config: SchedulerConfig,
    history_log: Option<BoundedJsonlLog<weave_storage::SchedulerHistoryEntry>>,
    state: Mutex<State>,
}

impl<C: Clock> ConcurrencyScheduler<C> {
    /// `history_log` persists every completed task's duration sample as
    /// JSONL (§4.5 Persistence); pass `None` to keep the rolling in-memory
    /// average only, as tests do.
    pub fn new(
        clock: C,
        config: SchedulerConfig,
        history_log: Option<BoundedJsonlLog<weave_storage::SchedulerHistoryEntry>>,
    ) -> Self {
        Self {
            clock,
            config,
            history_log,
            state: Mutex::new(State { pool: ResourcePool::new(), queue: Vec::new(), active: HashMap::new(), history: HashMap::new(), degraded: false }),
        }
    }

    pub fn register_resource(&self, name: impl Into<String>, capacity: u32) {
        self.state.lock().pool.register(name, capacity);
    }

    pub fn is_degraded(&self) -> bool {
        self.state.lock().degraded
    }

    /// §4.5 `evaluateScheduling`: the full six-step admission pipeline. `Ok`
    /// means admitted; `Err` carries the reason the task was denied.
    pub fn evaluate_scheduling(
        &self,
        description: &str,
        requirements: &[ResourceRequirement],
    ) -> Result<SchedulingDecision, SchedulerError> {
        let state = self.state.lock();

        // Step 1: resource check.
        let mut scarce_count = 0u32;
        for req in requirements {
            let Some(resource) = state.pool.get(&req.resource_name) else {
                return Err(SchedulerError::InsufficientResources { requirement: req.resource_name.clone() });
            };
            if resource.available() < req.min_level {
                return Err(SchedulerError::InsufficientResources { requirement: req.resource_name.clone() });
            }
            if resource.available() <= 1 {
                scarce_count += 1;
            }
        }

        // Step 5: degradation gates admission before we bother estimating.
        if state.degraded && self.config.pause_new_dispatches {
            return Err(SchedulerError::Degraded);
        }

        let task_type = infer_task_type(description);

        // Step 2: time estimate.
        let estimated_duration_ms = match self.config.time_estimate_mode {
            TimeEstimateMode::Static => self.static_estimate_ms(&task_type),
            TimeEstimateMode::Adaptive => {
                let static_estimate = self.static_estimate_ms(&task_type) as f64;
                match state.history.get(&task_type) {
                    Some(history) if history.sample_count >= 3 => {
                        let weight = self.config.adaptive_history_weight;
                        (history.avg_duration_ms * weight + static_estimate * (1.0 - weight)) as u64
                    }
                    _ => static_estimate as u64,
                }
            }
            TimeEstimateMode::LlmEstimate => self.config.llm_estimate_ms,
        };

        // Step 3: benefit score.
        let mut benefit_score = (estimated_duration_ms as f64) / (estimated_duration_ms as f64 + self.config.scheduling_overhead_ms as f64);
        benefit_score -= 0.1 * scarce_count as f64;
        let benefit_score = benefit_score.clamp(0.0, 1.0);

        // Step 4: concurrency check.
        let effective_max = if state.degraded { self.config.degraded_max_concurrency } else { self.config.global_max_concurrency };
        let active_total = state.active.len() as u32;
        if active_total >= effective_max {
            return Err(SchedulerError::ConcurrencyCapped { active: active_total, max: effective_max });
        }
        if let Some(&type_cap) = self.config.per_type_max_concurrency.get(&task_type) {
            let active_of_type = state.active.values().filter(|a| a.task_type == task_type).count() as u32;
            if active_of_type >= type_cap {
                return Err(SchedulerError::ConcurrencyCapped { active: active_of_type, max: type_cap });
            }
        }

        Ok(SchedulingDecision {
            estimated_start_time_ms: self.clock.epoch_ms(),
            estimated_duration_ms,
            benefit_score,
        })
    }

    fn static_estimate_ms(&self, task_type: &str) -> u64 {
        self.config.static_estimates_ms.get(task_type).copied().unwrap_or(self.config.llm_estimate_ms)
    }

    /// §4.5 Queue: append a task for later admission via [`Self::dequeue`].
    pub fn enqueue(&self, task_id: TaskId, description: impl Into<String>, requirements: Vec<ResourceRequirement>, priority: i64) {
        let enqueued_at_ms = self.clock.epoch_ms();
        self.state.lock().queue.push(QueuedTask { task_id, description: description.into(), requirements, base_priority: priority, enqueued_at_ms });
    }

    /// Reprioritize by aging, sort descending, and admit the first queued
    /// task that passes [`Self::evaluate_scheduling`]. Tasks that don't pass
    /// stay queued — nothing is evicted by time alone (§4.5 Queue).
    pub fn dequeue(&self) -> Option<(TaskId, SchedulingDecision)> {
        let now = self.clock.epoch_ms();
        let mut state = self.state.lock();
        let mut order: Vec<usize> = (0..state.queue.len()).collect();
        order.sort_by_key(|&i| {
            let task = &state.queue[i];
            std::cmp::Reverse(weave_core::aged_priority(task.base_priority, now.saturating_sub(task.enqueued_at_ms), self.config.aging_rate_ms))
        });

        for idx in order {
            let task = state.queue[idx].clone();
            drop(state);
            if let Ok(decision) = self.evaluate_scheduling(&task.description, &task.requirements) {
                let mut state_mut = self.state.lock();
                state_mut.queue.remove(idx);
                return Some((task.task_id, decision));
            }
            state = self.state.lock();
        }
        None
    }

    pub fn queue_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// §4.5 Task tracking: `startTask` — reserve resources and mark active.
    pub fn start_task(&self, task_id: TaskId, description: &str, resources: &[(String, u32)]) -> Result<(), SchedulerError> {
        let now = self.clock.epoch_ms();
        let mut state = self.state.lock();
        for (name, amount) in resources {
            let resource = state.pool.get_mut(name).ok_or_else(|| SchedulerError::InsufficientResources { requirement: name.clone() })?;
            if !resource.acquire(*amount) {
                return Err(SchedulerError::InsufficientResources { requirement: name.clone() });
            }
        }
        let task_type = infer_task_type(description);
        state.active.insert(task_id, ActiveTask { task_type, resources: resources.to_vec(), started_at_ms: now, enqueued_at_ms: now });
        self.reevaluate_degradation(&mut state);
        Ok(())
    }

    /// §4.5 Task tracking: `completeTask` — release resources, fold the
    /// outcome into the rolling per-type history, and re-check degradation.
    pub fn complete_task(&self, task_id: TaskId, success: bool) -> Result<(), SchedulerError> {
        let mut state = self.state.lock();
        let active = state.active.remove(&task_id).ok_or_else(|| SchedulerError::UnknownTask { id: task_id.to_string() })?;
        for (name, amount) in &active.resources {
            if let Some(resource) = state.pool.get_mut(name) {
                resource.release(*amount);
            }
        }

        let now = self.clock.epoch_ms();
        let duration_ms = now.saturating_sub(active.started_at_ms) as f64;
        let history = state.history.entry(active.task_type.clone()).or_default();
        history.sample_count += 1;
        let n = history.sample_count as f64;
        history.avg_duration_ms += (duration_ms - history.avg_duration_ms) / n;
        let success_value = if success { 1.0 } else { 0.0 };
        history.success_rate += (success_value - history.success_rate) / n;

        self.reevaluate_degradation(&mut state);
        Ok(())
    }

    fn reevaluate_degradation(&self, state: &mut State) {
        let total: u32 = state.pool.values().map(|r| r.capacity).sum();
        let busy: u32 = state.pool.values().map(|r| r.in_use).sum();
        let usage = if total == 0 { 0.0 } else { f64::from(busy) / f64::from(total) };
        state.degraded = usage > self.config.resource_usage_threshold;
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
