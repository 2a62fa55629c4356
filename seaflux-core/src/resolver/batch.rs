//! Batch resolution
//!
//! Resolves every required kind of a variable for a list of measurements.
//! Each (measurement, kind) pair is an independent task writing to its own
//! result slot; slots are merged in task order afterwards. A failing task is
//! recorded as a [`ResolutionFailure`] and the rest of the batch continues.
//!
//! With the `parallel` feature the tasks run on the rayon thread pool. The
//! index is frozen before resolution starts, so no locking is involved.

use core::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::SensorKindId;
use crate::errors::{ResolveError, ResolveResult};
use crate::index::{Measurement, MeasurementId};

use super::{MeasurementValue, ResolverContext};

/// A value that could not be resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionFailure {
    /// Measurement being resolved
    pub measurement_id: MeasurementId,
    /// Kind being resolved
    pub kind: SensorKindId,
    /// What went wrong
    pub error: ResolveError,
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "measurement {} / {}: {}",
            self.measurement_id, self.kind, self.error
        )
    }
}

/// Values and failures of one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Resolved values, in measurement then kind order
    pub values: Vec<MeasurementValue>,
    /// Per-value failures
    pub failures: Vec<ResolutionFailure>,
}

impl BatchOutcome {
    /// Value for one (measurement, kind) pair
    pub fn value(&self, measurement_id: MeasurementId, kind: &SensorKindId) -> Option<&MeasurementValue> {
        self.values
            .iter()
            .find(|v| v.measurement_id() == measurement_id && v.kind() == kind)
    }

    /// True if nothing failed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn push(&mut self, measurement: &Measurement, kind: &SensorKindId, result: ResolveResult<MeasurementValue>) {
        match result {
            Ok(value) => self.values.push(value),
            Err(error) => {
                let failure = ResolutionFailure {
                    measurement_id: measurement.id,
                    kind: kind.clone(),
                    error,
                };
                log::warn!("Resolution failed for {}", failure);
                self.failures.push(failure);
            }
        }
    }
}

impl ResolverContext<'_> {
    /// Resolve every required kind of the variable for `measurements`
    pub fn resolve_measurements<'m, I>(&self, measurements: I) -> BatchOutcome
    where
        I: IntoIterator<Item = &'m Measurement>,
    {
        let tasks: Vec<(&Measurement, &SensorKindId)> = measurements
            .into_iter()
            .flat_map(|m| self.variable.required_kinds.iter().map(move |k| (m, k)))
            .collect();

        #[cfg(feature = "parallel")]
        let results: Vec<ResolveResult<MeasurementValue>> =
            tasks.par_iter().map(|(m, k)| self.resolve(m, k)).collect();
        #[cfg(not(feature = "parallel"))]
        let results: Vec<ResolveResult<MeasurementValue>> =
            tasks.iter().map(|(m, k)| self.resolve(m, k)).collect();

        let mut outcome = BatchOutcome::default();
        for ((measurement, kind), result) in tasks.into_iter().zip(results) {
            outcome.push(measurement, kind, result);
        }

        log::info!(
            "Resolved variable {}: {} values, {} failures",
            self.variable.name,
            outcome.values.len(),
            outcome.failures.len()
        );
        outcome
    }

    /// Resolve the variable for every measurement of a run type it applies to
    pub fn resolve_variable(&self) -> BatchOutcome {
        let variable = self.variable;
        self.resolve_measurements(
            self.measurements
                .all()
                .iter()
                .filter(|m| variable.applies_to(&m.run_type)),
        )
    }
}
