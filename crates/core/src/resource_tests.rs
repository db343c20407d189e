// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn acquire_respects_capacity() {
    let mut r = Resource::new("cpu", 2);
    assert!(r.acquire(2));
    assert!(r.is_exhausted());
    assert!(!r.acquire(1));
}

#[test]
fn release_is_clamped_at_zero() {
    let mut r = Resource::new("cpu", 2);
    r.release(5);
    assert_eq!(r.in_use, 0);
    assert_eq!(r.available(), 2);
}

#[test]
fn utilization_tracks_in_use_over_capacity() {
    let mut r = Resource::new("cpu", 4);
    r.acquire(1);
    assert!((r.utilization() - 0.25).abs() < f64::EPSILON);
}

#[test]
fn zero_capacity_resource_is_always_exhausted() {
    let r = Resource::new("gpu", 0);
    assert!(r.is_exhausted());
    assert_eq!(r.utilization(), 1.0);
}
