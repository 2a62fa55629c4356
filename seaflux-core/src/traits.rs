//! Collaborator traits
//!
//! Storage, measurement location and calibration-set lookup live outside this
//! crate. Everything they supply is loaded before a resolution pass starts,
//! so none of these calls happen while values are being resolved in parallel,
//! apart from [`CalibrationSource`], which must therefore be `Sync`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ResolveResult;
use crate::index::Measurement;
use crate::resolver::MeasurementValue;
use crate::values::{DatasetId, FlagUpdate, RawPoint};

/// Source and sink of raw readings and their flags
pub trait RawValueStore {
    /// All raw readings of a dataset, in any order
    fn load_raw_points(&self, dataset: DatasetId) -> ResolveResult<Vec<RawPoint>>;

    /// Flag rewrites waiting to be applied before the index is frozen
    fn pending_flag_updates(&self, dataset: DatasetId) -> ResolveResult<Vec<FlagUpdate>> {
        let _ = dataset;
        Ok(Vec::new())
    }

    /// Persist flag rewrites
    fn persist_flag_updates(&mut self, dataset: DatasetId, updates: &[FlagUpdate]) -> ResolveResult<()>;
}

/// Source of located measurements and sink of calculated values
pub trait MeasurementStore {
    /// Measurements of a dataset, in any order
    fn load_measurements(&self, dataset: DatasetId) -> ResolveResult<Vec<Measurement>>;

    /// Persist calculated values
    fn persist_values(&mut self, dataset: DatasetId, values: &[MeasurementValue]) -> ResolveResult<()>;
}

/// Nominal concentrations of the calibration standards valid at one time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSet {
    /// Standard run type to nominal concentration
    pub targets: BTreeMap<String, f64>,
}

impl CalibrationSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a standard
    pub fn with_target(mut self, run_type: impl Into<String>, nominal: f64) -> Self {
        self.targets.insert(run_type.into(), nominal);
        self
    }

    /// True if the set holds no standards
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Lookup of the calibration set valid at a given time
pub trait CalibrationSource: Send + Sync {
    /// Calibration set for `instrument` at `time`
    fn calibration_set(&self, instrument: &str, time: DateTime<Utc>) -> ResolveResult<CalibrationSet>;
}

/// Calibration source for instruments without external standards
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCalibration;

impl CalibrationSource for NoCalibration {
    fn calibration_set(&self, _instrument: &str, _time: DateTime<Utc>) -> ResolveResult<CalibrationSet> {
        Ok(CalibrationSet::new())
    }
}
