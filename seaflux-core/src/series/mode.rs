//! Measurement-mode detection
//!
//! A series is **continuous** when its readings are mostly spaced within the
//! continuity threshold, and **periodic** when they come in short bursts
//! separated by long sleeps.
//!
//! ```text
//! Continuous:  ││││││││││││││││││││││││││││││││││
//! Periodic:    │││││              │││││             │││││
//!              └ group ┘  > 300s  └ group ┘  > 300s  └ group ┘
//! ```
//!
//! Only usable readings are scanned: flushing and empty readings neither
//! extend nor split a run.
//!
//! The scan walks consecutive readings and closes a group whenever the gap
//! exceeds the threshold. Textual series may also close a group when the value
//! changes, but only when the caller asks for it. The series is periodic iff
//! the time gaps produced more than one group, the mean group size is at most
//! [`MAX_MEAN_GROUP_SIZE`] and at most [`MAX_LARGE_GROUPS`] groups are larger
//! than [`LARGE_GROUP_SIZE`].

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::constants::{LARGE_GROUP_SIZE, MAX_LARGE_GROUPS, MAX_MEAN_GROUP_SIZE};
use crate::errors::ResolveError;
use crate::values::RawPoint;

/// Sampling cadence of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementMode {
    /// Readings used individually
    Continuous,
    /// Readings grouped into bursts and averaged
    Periodic,
}

impl MeasurementMode {
    /// Lower-case name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Periodic => "periodic",
        }
    }
}

impl fmt::Display for MeasurementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MeasurementMode {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" => Ok(Self::Continuous),
            "periodic" => Ok(Self::Periodic),
            _ => Err(ResolveError::InvalidMeasurementMode(s.to_string())),
        }
    }
}

/// Group statistics gathered by the mode scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupStats {
    /// Size of every group, in order
    pub sizes: Vec<usize>,
    /// Number of groups delimited by time gaps alone
    pub time_groups: usize,
}

impl GroupStats {
    /// Mean group size
    pub fn mean_size(&self) -> f64 {
        if self.sizes.is_empty() {
            return 0.0;
        }
        self.sizes.iter().sum::<usize>() as f64 / self.sizes.len() as f64
    }

    /// Number of groups larger than [`LARGE_GROUP_SIZE`]
    pub fn large_groups(&self) -> usize {
        self.sizes.iter().filter(|&&s| s > LARGE_GROUP_SIZE).count()
    }

    /// Classification implied by these statistics
    pub fn mode(&self) -> MeasurementMode {
        if self.time_groups > 1
            && self.mean_size() <= MAX_MEAN_GROUP_SIZE
            && self.large_groups() <= MAX_LARGE_GROUPS
        {
            MeasurementMode::Periodic
        } else {
            MeasurementMode::Continuous
        }
    }
}

/// Scan time-ordered points into run-length groups
pub fn scan_groups(
    points: &[Arc<RawPoint>],
    threshold: Duration,
    split_on_value_change: bool,
) -> GroupStats {
    let mut stats = GroupStats::default();
    if points.is_empty() {
        return stats;
    }

    let mut current = 1;
    stats.time_groups = 1;

    for pair in points.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);

        if next.time - prev.time > threshold {
            stats.sizes.push(current);
            stats.time_groups += 1;
            current = 1;
        } else if split_on_value_change && text_changed(prev, next) {
            stats.sizes.push(current);
            current = 1;
        } else {
            current += 1;
        }
    }
    stats.sizes.push(current);

    stats
}

fn text_changed(prev: &RawPoint, next: &RawPoint) -> bool {
    match (prev.value.as_text(), next.value.as_text()) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    }
}

/// Classify a time-ordered series
pub fn detect(
    points: &[Arc<RawPoint>],
    threshold: Duration,
    split_on_value_change: bool,
) -> MeasurementMode {
    let stats = scan_groups(points, threshold, split_on_value_change);
    let mode = stats.mode();
    log::debug!(
        "Mode scan: {} points, {} groups ({} by time), mean size {:.1}, {} large -> {}",
        points.len(),
        stats.sizes.len(),
        stats.time_groups,
        stats.mean_size(),
        stats.large_groups(),
        mode
    );
    mode
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SECONDS_PER_HOUR;
    use crate::values::{ColumnId, DatasetId, RawPointId, RawValue};
    use chrono::{TimeZone, Utc};

    fn series(offsets_secs: &[i64]) -> Vec<Arc<RawPoint>> {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        offsets_secs
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Arc::new(RawPoint::new(
                    RawPointId(i as u64),
                    DatasetId(1),
                    ColumnId(1),
                    start + Duration::seconds(*s),
                    RawValue::Numeric(i as f64),
                ))
            })
            .collect()
    }

    fn threshold() -> Duration {
        Duration::seconds(300)
    }

    #[test]
    fn evenly_spaced_is_continuous() {
        let points = series(&[0, 60, 120, 180, 240]);
        assert_eq!(detect(&points, threshold(), false), MeasurementMode::Continuous);
    }

    #[test]
    fn two_bursts_are_periodic() {
        let mut offsets: Vec<i64> = (0..5).map(|i| i * 60).collect();
        offsets.extend((0..5).map(|i| 4 * SECONDS_PER_HOUR + i * 60));
        let points = series(&offsets);

        let stats = scan_groups(&points, threshold(), false);
        assert_eq!(stats.sizes, vec![5, 5]);
        assert_eq!(stats.mode(), MeasurementMode::Periodic);
    }

    #[test]
    fn long_bursts_are_continuous() {
        // Two groups of 40 readings: mean size above 25
        let mut offsets: Vec<i64> = (0..40).map(|i| i * 10).collect();
        offsets.extend((0..40).map(|i| 7200 + i * 10));
        let points = series(&offsets);
        assert_eq!(detect(&points, threshold(), false), MeasurementMode::Continuous);
    }

    #[test]
    fn empty_and_single_are_continuous() {
        assert_eq!(detect(&[], threshold(), false), MeasurementMode::Continuous);
        assert_eq!(detect(&series(&[0]), threshold(), false), MeasurementMode::Continuous);
    }

    #[test]
    fn gap_equal_to_threshold_does_not_split() {
        let points = series(&[0, 300, 600]);
        let stats = scan_groups(&points, threshold(), false);
        assert_eq!(stats.sizes, vec![3]);
    }

    #[test]
    fn text_changes_split_only_when_enabled() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let points: Vec<Arc<RawPoint>> = ["STD1", "STD1", "SW", "SW"]
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Arc::new(RawPoint::new(
                    RawPointId(i as u64),
                    DatasetId(1),
                    ColumnId(1),
                    start + Duration::seconds(i as i64 * 30),
                    RawValue::Text(v.to_string()),
                ))
            })
            .collect();

        assert_eq!(scan_groups(&points, threshold(), false).sizes, vec![4]);
        let split = scan_groups(&points, threshold(), true);
        assert_eq!(split.sizes, vec![2, 2]);
        // Value splits never make a series periodic on their own
        assert_eq!(split.time_groups, 1);
        assert_eq!(split.mode(), MeasurementMode::Continuous);
    }

    #[test]
    fn parse_mode() {
        assert_eq!("Periodic".parse::<MeasurementMode>(), Ok(MeasurementMode::Periodic));
        assert!(matches!(
            "bursty".parse::<MeasurementMode>(),
            Err(ResolveError::InvalidMeasurementMode(_))
        ));
    }
}
