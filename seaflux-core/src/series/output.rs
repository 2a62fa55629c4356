//! Output-value construction
//!
//! Turns the raw readings of a series into the ordered derived points every
//! query works from.
//!
//! - **Continuous**: one derived point per usable reading, no averaging.
//! - **Periodic, numeric**: usable readings split at gaps beyond the
//!   continuity threshold; each group averaged at its best quality tier.
//! - **Periodic, textual**: groups also split whenever the value changes; each
//!   group collapses to its first member.
//!
//! Flushing and empty readings never join, start or extend a group, so a
//! flushing reading sitting between two bursts cannot bridge them.

use std::sync::Arc;

use chrono::Duration;

use super::averaging;
use super::mode::MeasurementMode;
use crate::derived::{DerivedPoint, DerivedValue};
use crate::values::RawPoint;

/// Build the derived points for a time-ordered series
pub fn build(
    points: &[Arc<RawPoint>],
    mode: MeasurementMode,
    threshold: Duration,
    textual: bool,
) -> Vec<DerivedPoint> {
    let usable: Vec<&RawPoint> = points
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| p.is_usable())
        .collect();

    match (mode, textual) {
        (MeasurementMode::Continuous, _) => usable
            .into_iter()
            .filter_map(DerivedPoint::from_raw)
            .collect(),
        (MeasurementMode::Periodic, false) => split_groups(&usable, threshold, false)
            .iter()
            .filter_map(|group| averaging::tiered_average(group, false))
            .collect(),
        (MeasurementMode::Periodic, true) => split_groups(&usable, threshold, true)
            .iter()
            .filter_map(|group| collapse_text(group))
            .collect(),
    }
}

/// Split time-ordered readings at gaps beyond `threshold` and, optionally, at
/// text value changes
pub fn split_groups<'a>(
    points: &[&'a RawPoint],
    threshold: Duration,
    split_on_value_change: bool,
) -> Vec<Vec<&'a RawPoint>> {
    let mut groups: Vec<Vec<&RawPoint>> = Vec::new();
    let mut current: Vec<&RawPoint> = Vec::new();

    for &point in points {
        if let Some(last) = current.last() {
            let gap = point.time - last.time > threshold;
            let changed = split_on_value_change && point.value != last.value;
            if gap || changed {
                groups.push(std::mem::take(&mut current));
            }
        }
        current.push(point);
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

fn collapse_text(group: &[&RawPoint]) -> Option<DerivedPoint> {
    let first = group.first()?;
    let value = DerivedValue::Text(first.value.as_text()?.to_string());
    DerivedPoint::from_group(
        group,
        value,
        first.effective_flag(),
        first.message.clone(),
        false,
    )
}
