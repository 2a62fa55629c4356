//! Variable-specific composite resolvers
//!
//! Both resolve their inputs through the normal dispatch, so an input may be
//! interpolated, aggregated or calibration-corrected like any other kind.

use crate::config::SensorKindId;
use crate::errors::ResolveResult;
use crate::index::Measurement;

use super::{MeasurementValue, ResolverContext};

/// Sum of two kinds, e.g. a gauge pressure plus ambient pressure.
///
/// Provenance is the union of both inputs and the flag the worse of the two.
/// If either input has no value, neither does the sum.
pub fn summation(
    ctx: &ResolverContext<'_>,
    measurement: &Measurement,
    kind: &SensorKindId,
    (left, right): (&SensorKindId, &SensorKindId),
    depth: usize,
) -> ResolveResult<MeasurementValue> {
    let left = ctx.resolve_nested(measurement, left, depth + 1)?;
    let right = ctx.resolve_nested(measurement, right, depth + 1)?;

    if !left.has_value() || !right.has_value() {
        return Ok(MeasurementValue::empty(measurement.id, kind.clone()));
    }

    let sum = left.calculated_value() + right.calculated_value();
    Ok(MeasurementValue::combined(
        measurement.id,
        kind.clone(),
        sum,
        [&left, &right],
    ))
}

/// Wet-basis concentration converted to dry basis.
///
/// `dry = wet / (1 - moisture / 1000)` when the instrument requires drying;
/// otherwise the wet value passes through. A wet value with no members
/// short-circuits without resolving moisture, and moisture of 1000 or more
/// leaves nothing to divide by, so the result is empty.
pub fn moisture_correction(
    ctx: &ResolverContext<'_>,
    measurement: &Measurement,
    kind: &SensorKindId,
    (wet, moisture): (&SensorKindId, &SensorKindId),
    depth: usize,
) -> ResolveResult<MeasurementValue> {
    let wet = ctx.resolve_nested(measurement, wet, depth + 1)?;
    if wet.member_count() == 0 {
        return Ok(MeasurementValue::empty(measurement.id, kind.clone()));
    }
    if !ctx.config.drying_required {
        return Ok(wet.relabelled(kind.clone()));
    }

    let moisture = ctx.resolve_nested(measurement, moisture, depth + 1)?;
    if !moisture.has_value() {
        return Ok(MeasurementValue::empty(measurement.id, kind.clone()));
    }

    let dry_fraction = 1.0 - moisture.calculated_value() / 1000.0;
    if dry_fraction <= 0.0 {
        log::warn!(
            "Measurement {}: moisture {} leaves no dry fraction for {}",
            measurement.id,
            moisture.calculated_value(),
            kind
        );
        return Ok(MeasurementValue::empty(measurement.id, kind.clone()));
    }

    let dry = wet.calculated_value() / dry_fraction;
    Ok(MeasurementValue::combined(
        measurement.id,
        kind.clone(),
        dry,
        [&wet, &moisture],
    ))
}
