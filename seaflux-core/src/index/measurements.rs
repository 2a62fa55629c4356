//! Dataset measurements grouped by run type and time
//!
//! Measurements arrive from the measurement-locating stage as an ordered list
//! of `{id, time, run type}`. A *run* is a maximal stretch of consecutive
//! measurements sharing one run type:
//!
//! ```text
//! time ──►  SW SW SW  STD1 STD1  SW SW  STD2 STD2 STD2  SW
//!           └ run ──┘ └─ run ──┘ └run┘  └──── run ────┘ └┘
//! ```
//!
//! Calibration correction walks these runs outward from a measurement.

use core::fmt;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier of a measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementId(pub u64);

impl fmt::Display for MeasurementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Externally supplied time window for a measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementWindow {
    /// Window start, inclusive
    pub start: DateTime<Utc>,
    /// Window end, inclusive
    pub end: DateTime<Utc>,
}

/// A point in time at which variables are calculated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Identifier
    pub id: MeasurementId,
    /// Reference time
    pub time: DateTime<Utc>,
    /// Run classification, e.g. a seawater or a standard run type
    pub run_type: String,
    /// Window from a paired run-type series, if known
    #[serde(default)]
    pub window: Option<MeasurementWindow>,
}

impl Measurement {
    /// Measurement without a window
    pub fn new(id: MeasurementId, time: DateTime<Utc>, run_type: impl Into<String>) -> Self {
        Self {
            id,
            time,
            run_type: run_type.into(),
            window: None,
        }
    }

    /// Attach a window
    pub fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.window = Some(MeasurementWindow { start, end });
        self
    }

    /// Earliest time covered
    pub fn start(&self) -> DateTime<Utc> {
        self.window.map_or(self.time, |w| w.start.min(self.time))
    }

    /// Latest time covered
    pub fn end(&self) -> DateTime<Utc> {
        self.window.map_or(self.time, |w| w.end.max(self.time))
    }
}

/// Consecutive measurements of one run type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Run<'a> {
    measurements: &'a [Measurement],
}

impl<'a> Run<'a> {
    /// Run type shared by every member
    pub fn run_type(&self) -> &'a str {
        self.measurements
            .first()
            .map(|m| m.run_type.as_str())
            .unwrap_or_default()
    }

    /// Members in time order
    pub fn measurements(&self) -> &'a [Measurement] {
        self.measurements
    }

    /// Earliest time covered by any member
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.measurements.iter().map(Measurement::start).min()
    }

    /// Latest time covered by any member
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.measurements.iter().map(Measurement::end).max()
    }
}

/// Measurements of a dataset in time order
#[derive(Debug, Clone, Default)]
pub struct DatasetMeasurements {
    measurements: Vec<Measurement>,
    by_id: HashMap<MeasurementId, usize>,
    by_run_type: BTreeMap<String, Vec<usize>>,
}

impl DatasetMeasurements {
    /// Index measurements, sorting them by time
    pub fn new(mut measurements: Vec<Measurement>) -> Self {
        measurements.sort_by_key(|m| m.time);

        let mut by_id = HashMap::with_capacity(measurements.len());
        let mut by_run_type: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, m) in measurements.iter().enumerate() {
            by_id.insert(m.id, i);
            by_run_type.entry(m.run_type.clone()).or_default().push(i);
        }

        Self {
            measurements,
            by_id,
            by_run_type,
        }
    }

    /// All measurements in time order
    pub fn all(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Measurement by id
    pub fn get(&self, id: MeasurementId) -> Option<&Measurement> {
        self.by_id.get(&id).map(|&i| &self.measurements[i])
    }

    /// Measurements of one run type in time order
    pub fn of_run_type(&self, run_type: &str) -> Vec<&Measurement> {
        self.by_run_type
            .get(run_type)
            .map(|indices| indices.iter().map(|&i| &self.measurements[i]).collect())
            .unwrap_or_default()
    }

    /// Distinct run types
    pub fn run_types(&self) -> impl Iterator<Item = &str> {
        self.by_run_type.keys().map(String::as_str)
    }

    /// Every run in time order
    pub fn runs(&self) -> Vec<Run<'_>> {
        self.measurements
            .chunk_by(|a, b| a.run_type == b.run_type)
            .map(|measurements| Run { measurements })
            .collect()
    }

    /// Runs of one run type in time order
    pub fn runs_of(&self, run_type: &str) -> Vec<Run<'_>> {
        self.runs()
            .into_iter()
            .filter(|r| r.run_type() == run_type)
            .collect()
    }

    /// Number of measurements
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    /// True if there are no measurements
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn dataset() -> DatasetMeasurements {
        let types = ["SW", "SW", "STD1", "STD1", "SW", "STD2", "SW", "STD1"];
        // Supplied out of order on purpose
        let measurements = types
            .iter()
            .enumerate()
            .rev()
            .map(|(i, rt)| Measurement::new(MeasurementId(i as u64), at(i as i64 * 10), *rt))
            .collect();
        DatasetMeasurements::new(measurements)
    }

    #[test]
    fn sorted_and_indexed() {
        let d = dataset();
        assert_eq!(d.len(), 8);
        assert_eq!(d.all()[0].id, MeasurementId(0));
        assert_eq!(d.get(MeasurementId(5)).unwrap().run_type, "STD2");
        assert_eq!(d.of_run_type("SW").len(), 4);
        assert_eq!(d.run_types().collect::<Vec<_>>(), vec!["STD1", "STD2", "SW"]);
    }

    #[test]
    fn runs_are_consecutive_stretches() {
        let d = dataset();
        let runs = d.runs();
        let shape: Vec<(&str, usize)> = runs
            .iter()
            .map(|r| (r.run_type(), r.measurements().len()))
            .collect();
        assert_eq!(
            shape,
            vec![("SW", 2), ("STD1", 2), ("SW", 1), ("STD2", 1), ("SW", 1), ("STD1", 1)]
        );

        let std1 = d.runs_of("STD1");
        assert_eq!(std1.len(), 2);
        assert_eq!(std1[0].start(), Some(at(20)));
        assert_eq!(std1[0].end(), Some(at(30)));
    }

    #[test]
    fn window_extends_coverage() {
        let m = Measurement::new(MeasurementId(1), at(10), "SW").with_window(at(8), at(12));
        assert_eq!(m.start(), at(8));
        assert_eq!(m.end(), at(12));
    }
}
