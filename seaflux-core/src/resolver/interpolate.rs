//! Default interpolating resolver
//!
//! The variable's core kind defines the measurement, so it is looked up
//! exactly and never interpolated. Every other kind asks its series for a
//! value at the measurement time, or over the measurement's window when one
//! was supplied, with interpolation allowed. Kinds that require calibration
//! are then corrected against the bracketing standard runs.

use crate::config::SensorKindId;
use crate::errors::ResolveResult;
use crate::index::Measurement;

use super::{calibration, MeasurementValue, ResolverContext};

/// Resolve a kind from its own series
pub fn resolve(
    ctx: &ResolverContext<'_>,
    measurement: &Measurement,
    kind: &SensorKindId,
) -> ResolveResult<MeasurementValue> {
    let empty = || MeasurementValue::empty(measurement.id, kind.clone());
    let Some(series) = ctx.index.series(kind) else {
        return Ok(empty());
    };

    let value = if ctx.variable.is_core(kind) {
        match series.raw_at(measurement.time) {
            Some(point) if point.is_usable() => {
                MeasurementValue::from_raw(measurement.id, kind.clone(), point)?
            }
            _ => return Ok(empty()),
        }
    } else {
        let point = match measurement.window {
            Some(window) => series.value_in_window(window.start, window.end, measurement.time, true)?,
            None => series.value_at(measurement.time, true)?,
        };
        match point {
            Some(point) => MeasurementValue::from_derived(measurement.id, kind.clone(), &point)?,
            None => return Ok(empty()),
        }
    };

    let requires_calibration = ctx
        .config
        .kind(kind)
        .map(|k| k.requires_calibration)
        .unwrap_or(false);

    if requires_calibration && value.has_value() {
        calibration::correct(ctx, measurement, value)
    } else {
        Ok(value)
    }
}
