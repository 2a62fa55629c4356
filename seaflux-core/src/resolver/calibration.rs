//! Calibration-offset correction
//!
//! Sensors drift. Instruments that run known-concentration standards between
//! seawater measurements correct each value by the offset the standards show
//! around it.
//!
//! ```text
//!          STD1 run        SW measurement         STD1 run
//!   ──────[ ■ ■ ■ ]────────────── ▲ ───────────[ ■ ■ ]──────► time
//!         offset o₀               │            offset o₁
//!                                 └── o(t) interpolated between o₀ and o₁
//! ```
//!
//! For every standard in the calibration set valid at the measurement time:
//!
//! 1. Walk that standard's runs outward from the measurement, run by run,
//!    until a run with good readings is found on each side.
//! 2. Each found run gives an offset sample: mean reading minus nominal
//!    concentration, at the mean reading time.
//! 3. Interpolate the two samples to the measurement time, or use the only
//!    one found.
//!
//! With one usable standard its offset is subtracted directly. With several,
//! a line is fitted through (nominal concentration, offset) and evaluated at
//! the value being corrected, so the offset may vary with concentration as
//! well as time. With none the value passes through unchanged.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::errors::ResolveResult;
use crate::index::{Measurement, Run};
use crate::series::TimeSeries;
use crate::stats::{self, LinearFit};
use crate::values::{RawPoint, RawPointId};

use super::{MeasurementValue, ResolverContext};

/// Offset of one standard run
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetSample {
    /// Mean time of the readings used
    pub time: DateTime<Utc>,
    /// Mean reading minus nominal concentration
    pub offset: f64,
    /// Readings used
    pub ids: Vec<RawPointId>,
}

/// Correct `value` against the calibration standards around `measurement`
pub fn correct(
    ctx: &ResolverContext<'_>,
    measurement: &Measurement,
    value: MeasurementValue,
) -> ResolveResult<MeasurementValue> {
    let set = ctx
        .calibration
        .calibration_set(&ctx.config.instrument_id, measurement.time)?;
    let Some(series) = ctx.index.series(value.kind()) else {
        return Ok(value);
    };

    let mut samples: Vec<(f64, f64)> = Vec::new();
    let mut supporting = BTreeSet::new();

    for (target, &nominal) in &set.targets {
        let runs = ctx.measurements.runs_of(target);
        if let Some((offset, ids)) = target_offset(ctx, series, &runs, measurement.time, nominal) {
            samples.push((nominal, offset));
            supporting.extend(ids);
        }
    }

    let raw = value.calculated_value();
    let offset = match samples.as_slice() {
        [] => {
            log::warn!(
                "No usable calibration runs for {} at measurement {}; value left uncorrected",
                value.kind(),
                measurement.id
            );
            return Ok(value);
        }
        [(_, offset)] => *offset,
        _ => match LinearFit::fit(&samples) {
            Some(fit) => fit.predict(raw),
            None => {
                let offsets: Vec<f64> = samples.iter().map(|(_, o)| *o).collect();
                stats::mean(&offsets).unwrap_or(0.0)
            }
        },
    };

    log::debug!(
        "Calibration offset {:.4} applied to {} at measurement {} ({} standards)",
        offset,
        value.kind(),
        measurement.id,
        samples.len()
    );
    Ok(value.corrected(raw - offset, supporting))
}

/// Offset of one standard interpolated to `time`, with the readings used
fn target_offset(
    ctx: &ResolverContext<'_>,
    series: &TimeSeries,
    runs: &[Run<'_>],
    time: DateTime<Utc>,
    nominal: f64,
) -> Option<(f64, Vec<RawPointId>)> {
    let limit = ctx.config.max_calibration_search();
    let within = |t: DateTime<Utc>| {
        let distance = if t > time { t - time } else { time - t };
        limit.map_or(true, |limit| distance <= limit)
    };

    let prior = runs
        .iter()
        .rev()
        .filter(|r| r.end().is_some_and(|end| end < time))
        .take_while(|r| r.end().is_some_and(&within))
        .find_map(|r| run_sample(series, r, nominal));
    let next = runs
        .iter()
        .filter(|r| r.start().is_some_and(|start| start > time))
        .take_while(|r| r.start().is_some_and(&within))
        .find_map(|r| run_sample(series, r, nominal));

    match (prior, next) {
        (Some(p), Some(n)) => {
            let offset = stats::interpolate_at(p.time, p.offset, n.time, n.offset, time);
            let mut ids = p.ids;
            ids.extend(n.ids);
            Some((offset, ids))
        }
        (Some(sample), None) | (None, Some(sample)) => Some((sample.offset, sample.ids)),
        (None, None) => None,
    }
}

/// Offset sample from the good readings of one run, if it has any
pub fn run_sample(series: &TimeSeries, run: &Run<'_>, nominal: f64) -> Option<OffsetSample> {
    let (start, end) = (run.start()?, run.end()?);
    let good: Vec<&RawPoint> = series
        .raw_between(start, end)
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| p.is_usable() && p.effective_flag().is_good() && p.value.as_f64().is_some())
        .collect();

    let values: Vec<f64> = good.iter().filter_map(|p| p.value.as_f64()).collect();
    let times: Vec<DateTime<Utc>> = good.iter().map(|p| p.time).collect();

    Some(OffsetSample {
        time: stats::mean_time(&times)?,
        offset: stats::mean(&values)? - nominal,
        ids: good.iter().map(|p| p.id).collect(),
    })
}
