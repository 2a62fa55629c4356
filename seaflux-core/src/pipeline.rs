//! One-pass dataset processing
//!
//! ```text
//! load raw points ─► apply flag updates ─► freeze index ─► load measurements
//!                                                               │
//!        persist values ◄─ resolve (measurement × required kind)┘
//! ```
//!
//! All loading happens before resolution starts. Structural problems in the
//! raw data stop the run; failures of single values are returned in the
//! outcome next to the values that did resolve.

use crate::config::InstrumentConfig;
use crate::errors::{ResolveError, ResolveResult};
use crate::index::{DatasetIndexBuilder, DatasetMeasurements};
use crate::resolver::{BatchOutcome, ResolverContext};
use crate::traits::{CalibrationSource, MeasurementStore, RawValueStore};
use crate::values::DatasetId;

/// Resolve one variable for a whole dataset and persist the results
pub fn process_dataset<S>(
    config: &InstrumentConfig,
    variable: &str,
    dataset: DatasetId,
    store: &mut S,
    calibration: &dyn CalibrationSource,
) -> ResolveResult<BatchOutcome>
where
    S: RawValueStore + MeasurementStore,
{
    let variable = config
        .variable(variable)
        .ok_or_else(|| ResolveError::UnknownVariable(variable.to_string()))?;

    let points = store.load_raw_points(dataset)?;
    let updates = store.pending_flag_updates(dataset)?;

    let mut builder = DatasetIndexBuilder::new(config)?;
    builder.extend(points)?;
    builder.apply_flag_updates(&updates)?;
    if !updates.is_empty() {
        store.persist_flag_updates(dataset, &updates)?;
    }
    let index = builder.build();

    let measurements = DatasetMeasurements::new(store.load_measurements(dataset)?);
    let ctx = ResolverContext::new(config, variable, &index, &measurements, calibration);
    let outcome = ctx.resolve_variable();

    store.persist_values(dataset, &outcome.values)?;
    log::info!(
        "Dataset {} processed for {}: {} readings, {} measurements, {} values, {} failures",
        dataset,
        variable.name,
        index.len(),
        measurements.len(),
        outcome.values.len(),
        outcome.failures.len()
    );

    Ok(outcome)
}
