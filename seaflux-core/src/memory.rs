//! In-memory collaborators for testing and replay
//!
//! [`MemoryStore`] implements both store traits over plain collections, and
//! [`MemoryCalibration`] serves calibration sets by deployment time.
//!
//! ## Example
//!
//! ```rust
//! use seaflux_core::memory::{MemoryCalibration, MemoryStore};
//! use seaflux_core::traits::{CalibrationSet, CalibrationSource, RawValueStore};
//! use seaflux_core::values::DatasetId;
//! use chrono::{TimeZone, Utc};
//!
//! let store = MemoryStore::new();
//! assert!(store.load_raw_points(DatasetId(1))?.is_empty());
//!
//! let deployed = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let calibration = MemoryCalibration::new()
//!     .with_set("gf-1", deployed, CalibrationSet::new().with_target("STD1", 250.0));
//! let later = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
//! assert_eq!(calibration.calibration_set("gf-1", later)?.targets["STD1"], 250.0);
//! # Ok::<(), seaflux_core::ResolveError>(())
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::errors::ResolveResult;
use crate::index::Measurement;
use crate::resolver::MeasurementValue;
use crate::traits::{CalibrationSet, CalibrationSource, MeasurementStore, RawValueStore};
use crate::values::{DatasetId, FlagUpdate, RawPoint};

/// Raw readings, measurements and results held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    raw: HashMap<DatasetId, Vec<RawPoint>>,
    pending: HashMap<DatasetId, Vec<FlagUpdate>>,
    measurements: HashMap<DatasetId, Vec<Measurement>>,
    persisted_flags: HashMap<DatasetId, Vec<FlagUpdate>>,
    persisted_values: HashMap<DatasetId, Vec<MeasurementValue>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add raw readings to a dataset
    pub fn with_points<I: IntoIterator<Item = RawPoint>>(mut self, dataset: DatasetId, points: I) -> Self {
        self.raw.entry(dataset).or_default().extend(points);
        self
    }

    /// Queue flag rewrites for a dataset
    pub fn with_flag_updates<I: IntoIterator<Item = FlagUpdate>>(mut self, dataset: DatasetId, updates: I) -> Self {
        self.pending.entry(dataset).or_default().extend(updates);
        self
    }

    /// Add measurements to a dataset
    pub fn with_measurements<I: IntoIterator<Item = Measurement>>(mut self, dataset: DatasetId, measurements: I) -> Self {
        self.measurements.entry(dataset).or_default().extend(measurements);
        self
    }

    /// Flag rewrites persisted for a dataset
    pub fn persisted_flags(&self, dataset: DatasetId) -> &[FlagUpdate] {
        self.persisted_flags.get(&dataset).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Values persisted for a dataset
    pub fn persisted_values(&self, dataset: DatasetId) -> &[MeasurementValue] {
        self.persisted_values.get(&dataset).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl RawValueStore for MemoryStore {
    fn load_raw_points(&self, dataset: DatasetId) -> ResolveResult<Vec<RawPoint>> {
        Ok(self.raw.get(&dataset).cloned().unwrap_or_default())
    }

    fn pending_flag_updates(&self, dataset: DatasetId) -> ResolveResult<Vec<FlagUpdate>> {
        Ok(self.pending.get(&dataset).cloned().unwrap_or_default())
    }

    fn persist_flag_updates(&mut self, dataset: DatasetId, updates: &[FlagUpdate]) -> ResolveResult<()> {
        self.persisted_flags
            .entry(dataset)
            .or_default()
            .extend_from_slice(updates);
        self.pending.remove(&dataset);
        Ok(())
    }
}

impl MeasurementStore for MemoryStore {
    fn load_measurements(&self, dataset: DatasetId) -> ResolveResult<Vec<Measurement>> {
        Ok(self.measurements.get(&dataset).cloned().unwrap_or_default())
    }

    fn persist_values(&mut self, dataset: DatasetId, values: &[MeasurementValue]) -> ResolveResult<()> {
        self.persisted_values
            .entry(dataset)
            .or_default()
            .extend_from_slice(values);
        Ok(())
    }
}

/// Calibration sets by instrument and deployment time.
///
/// The set valid at a time is the latest one deployed at or before it.
#[derive(Debug, Clone, Default)]
pub struct MemoryCalibration {
    sets: HashMap<String, BTreeMap<DateTime<Utc>, CalibrationSet>>,
}

impl MemoryCalibration {
    /// No calibration sets
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy a set for an instrument
    pub fn with_set(mut self, instrument: impl Into<String>, deployed: DateTime<Utc>, set: CalibrationSet) -> Self {
        self.sets
            .entry(instrument.into())
            .or_default()
            .insert(deployed, set);
        self
    }
}

impl CalibrationSource for MemoryCalibration {
    fn calibration_set(&self, instrument: &str, time: DateTime<Utc>) -> ResolveResult<CalibrationSet> {
        Ok(self
            .sets
            .get(instrument)
            .and_then(|sets| sets.range(..=time).next_back())
            .map(|(_, set)| set.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn latest_deployment_wins() {
        let jan = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mar = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let calibration = MemoryCalibration::new()
            .with_set("gf-1", jan, CalibrationSet::new().with_target("STD1", 250.0))
            .with_set("gf-1", mar, CalibrationSet::new().with_target("STD1", 260.0));

        let feb = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(calibration.calibration_set("gf-1", feb).unwrap().targets["STD1"], 250.0);
        assert_eq!(calibration.calibration_set("gf-1", mar).unwrap().targets["STD1"], 260.0);

        let before = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert!(calibration.calibration_set("gf-1", before).unwrap().is_empty());
        assert!(calibration.calibration_set("other", feb).unwrap().is_empty());
    }
}
