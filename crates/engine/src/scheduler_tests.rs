// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use weave_core::FakeClock;

fn scheduler(config: SchedulerConfig) -> ConcurrencyScheduler<FakeClock> {
    let scheduler = ConcurrencyScheduler::new(FakeClock::new(), config);
    scheduler.register_resource("cpu", 4);
    scheduler
}

#[test]
fn infer_task_type_matches_known_keywords() {
    assert_eq!(infer_task_type("please run the unit tests"), "test");
    assert_eq!(infer_task_type("deploy the new build"), "build");
    assert_eq!(infer_task_type("write a poem"), "general");
}

#[test]
fn evaluate_scheduling_denies_when_resource_unknown() {
    let scheduler = scheduler(SchedulerConfig::default());
    let err = scheduler.evaluate_scheduling("task", &[ResourceRequirement::new("gpu", 1)]).unwrap_err();
    assert!(matches!(err, SchedulerError::InsufficientResources { .. }));
}

#[test]
fn evaluate_scheduling_denies_when_below_min_level() {
    let scheduler = scheduler(SchedulerConfig::default());
    let err = scheduler.evaluate_scheduling("task", &[ResourceRequirement::new("cpu", 5)]).unwrap_err();
    assert!(matches!(err, SchedulerError::InsufficientResources { .. }));
}

#[test]
fn evaluate_scheduling_admits_when_resources_available() {
    let scheduler = scheduler(SchedulerConfig::default());
    let decision = scheduler.evaluate_scheduling("run the build", &[ResourceRequirement::new("cpu", 1)]).unwrap();
    assert!(decision.benefit_score > 0.0);
    assert!(decision.estimated_duration_ms > 0);
}

#[test]
fn benefit_score_penalized_for_scarce_resources() {
    let scheduler = scheduler(SchedulerConfig::default());
    scheduler.start_task(TaskId::new(), "consume", &[("cpu".to_string(), 3)]).unwrap();

    let decision = scheduler.evaluate_scheduling("task", &[ResourceRequirement::new("cpu", 1)]).unwrap();
    assert!(decision.benefit_score < 1.0);
}

#[test]
fn concurrency_cap_denies_once_global_max_reached() {
    let mut config = SchedulerConfig::default();
    config.global_max_concurrency = 1;
    let scheduler = scheduler(config);

    scheduler.start_task(TaskId::new(), "task one", &[]).unwrap();
    let err = scheduler.evaluate_scheduling("task two", &[]).unwrap_err();
    assert!(matches!(err, SchedulerError::ConcurrencyCapped { .. }));
}

#[test]
fn per_type_cap_denies_independent_of_global_cap() {
    let mut config = SchedulerConfig::default();
    config.global_max_concurrency = 10;
    config.per_type_max_concurrency.insert("test".to_string(), 1);
    let scheduler = scheduler(config);

    scheduler.start_task(TaskId::new(), "run the tests", &[]).unwrap();
    let err = scheduler.evaluate_scheduling("run more tests", &[]).unwrap_err();
    assert!(matches!(err, SchedulerError::ConcurrencyCapped { .. }));
}

#[test]
fn degraded_mode_denies_new_admissions_when_configured_to_pause() {
    let mut config = SchedulerConfig::default();
    config.resource_usage_threshold = 0.1;
    config.pause_new_dispatches = true;
    let scheduler = scheduler(config);

    scheduler.start_task(TaskId::new(), "heavy task", &[("cpu".to_string(), 1)]).unwrap();
    assert!(scheduler.is_degraded());

    let err = scheduler.evaluate_scheduling("another task", &[]).unwrap_err();
    assert!(matches!(err, SchedulerError::Degraded));
}

#[test]
fn complete_task_releases_resources_and_exits_degraded_mode() {
    let mut config = SchedulerConfig::default();
    config.resource_usage_threshold = 0.1;
    let scheduler = scheduler(config);

    let id = TaskId::new();
    scheduler.start_task(id, "heavy task", &[("cpu".to_string(), 4)]).unwrap();
    assert!(scheduler.is_degraded());

    scheduler.complete_task(id, true).unwrap();
    assert!(!scheduler.is_degraded());
}

#[test]
fn complete_task_updates_adaptive_history() {
    let mut config = SchedulerConfig::default();
    config.time_estimate_mode = TimeEstimateMode::Adaptive;
    config.static_estimates_ms.insert("test".to_string(), 1_000);
    let scheduler = scheduler(config);

    for _ in 0..3 {
        let id = TaskId::new();
        scheduler.start_task(id, "run the tests", &[]).unwrap();
        scheduler.complete_task(id, true).unwrap();
    }

    let decision = scheduler.evaluate_scheduling("run the tests", &[]).unwrap();
    assert!(decision.estimated_duration_ms > 0);
}

#[test]
fn complete_task_for_unknown_id_errors() {
    let scheduler = scheduler(SchedulerConfig::default());
    let err = scheduler.complete_task(TaskId::new(), true).unwrap_err();
    assert!(matches!(err, SchedulerError::UnknownTask { .. }));
}

#[test]
fn enqueue_and_dequeue_admits_the_first_eligible_task() {
    let scheduler = scheduler(SchedulerConfig::default());
    let id = TaskId::new();
    scheduler.enqueue(id, "run the tests", vec![ResourceRequirement::new("cpu", 1)], 0);

    let (dequeued_id, _decision) = scheduler.dequeue().unwrap();
    assert_eq!(dequeued_id, id);
    assert_eq!(scheduler.queue_len(), 0);
}

#[test]
fn dequeue_leaves_ineligible_tasks_queued() {
    let scheduler = scheduler(SchedulerConfig::default());
    let id = TaskId::new();
    scheduler.enqueue(id, "task", vec![ResourceRequirement::new("gpu", 1)], 0);

    assert!(scheduler.dequeue().is_none());
    assert_eq!(scheduler.queue_len(), 1);
}

#[test]
fn dequeue_prefers_higher_aged_priority() {
    let scheduler = scheduler(SchedulerConfig::default());
    let low = TaskId::new();
    let high = TaskId::new();
    scheduler.enqueue(low, "low priority", vec![], 0);
    scheduler.enqueue(high, "high priority", vec![], 10);

    let (dequeued_id, _) = scheduler.dequeue().unwrap();
    assert_eq!(dequeued_id, high);
}
