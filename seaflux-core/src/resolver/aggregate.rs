//! Parent/child aggregation
//!
//! A parent kind (e.g. equilibrator temperature measured by two probes) has no
//! series of its own. Each child is resolved through the full dispatch and the
//! results are combined as a member-count weighted mean. Children with no
//! members are left out entirely.

use crate::config::SensorKindId;
use crate::errors::ResolveResult;
use crate::index::Measurement;
use crate::stats;

use super::{MeasurementValue, ResolverContext};

/// Resolve a parent kind from its children
pub fn resolve(
    ctx: &ResolverContext<'_>,
    measurement: &Measurement,
    kind: &SensorKindId,
    depth: usize,
) -> ResolveResult<MeasurementValue> {
    let parent = ctx.config.kind(kind)?;

    let mut children = Vec::with_capacity(parent.children.len());
    for child in &parent.children {
        let value = ctx.resolve_nested(measurement, child, depth + 1)?;
        if value.has_value() {
            children.push(value);
        }
    }

    let mean = stats::weighted_mean(
        children
            .iter()
            .map(|c| (c.calculated_value(), c.member_count() as f64)),
    );

    Ok(match mean {
        Some(mean) => MeasurementValue::combined(measurement.id, kind.clone(), mean, &children),
        None => MeasurementValue::empty(measurement.id, kind.clone()),
    })
}
