//! Common test utilities for integration tests
//!
//! This module provides:
//! - Reading and series generators for continuous and bursty sensors
//! - Canned instrument configurations and datasets
//! - Assertion helpers for resolved values

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};

use seaflux_core::{DerivedPoint, MeasurementValue};

pub mod generators;
pub mod scenarios;

/// Fixed reference time used by every fixture: 2024-03-01 10:00:00 UTC
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
}

/// Reference time plus `secs` seconds
pub fn at(secs: i64) -> DateTime<Utc> {
    base_time() + Duration::seconds(secs)
}

/// Reference time plus `minutes` minutes
pub fn at_min(minutes: i64) -> DateTime<Utc> {
    base_time() + Duration::minutes(minutes)
}

/// Assert two floats agree to within `tolerance`
pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} (±{}), got {}",
        expected,
        tolerance,
        actual
    );
}

/// Numeric value of a derived point, panicking on anything else
pub fn numeric(point: &Option<DerivedPoint>) -> f64 {
    point
        .as_ref()
        .expect("expected a value")
        .numeric()
        .expect("expected a numeric value")
}

/// Assert a measurement value carries a calculated number
pub fn assert_has_value(value: &MeasurementValue) {
    assert!(
        value.has_value(),
        "{} for measurement {} has no value",
        value.kind(),
        value.measurement_id()
    );
}
