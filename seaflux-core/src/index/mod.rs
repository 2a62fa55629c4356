//! Dataset Index
//!
//! Cross-reference structures over every raw reading of one dataset:
//!
//! | Lookup            | Structure                                   |
//! |-------------------|---------------------------------------------|
//! | by raw point id   | `HashMap<RawPointId, Arc<RawPoint>>`        |
//! | by column         | `BTreeMap<ColumnId, Vec<Arc<RawPoint>>>`    |
//! | by sensor kind    | `BTreeMap<SensorKindId, TimeSeries>`        |
//! | by (time, column) | `BTreeMap<(DateTime, ColumnId), Arc<..>>`   |
//!
//! Readings are shared by reference count between the series and the
//! lookup maps; nothing is copied after the index is frozen.
//!
//! Like the series it holds, the index is assembled by a builder that accepts
//! readings and flag rewrites, then frozen by [`DatasetIndexBuilder::build`].

pub mod measurements;

pub use measurements::{DatasetMeasurements, Measurement, MeasurementId, MeasurementWindow, Run};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{InstrumentConfig, SensorKindId};
use crate::errors::{ResolveError, ResolveResult};
use crate::series::{TimeSeries, TimeSeriesBuilder};
use crate::values::{ColumnId, FlagUpdate, RawPoint, RawPointId};

/// Collects a dataset's readings into one series builder per sensor kind
#[derive(Debug, Clone)]
pub struct DatasetIndexBuilder {
    columns: HashMap<ColumnId, SensorKindId>,
    series: BTreeMap<SensorKindId, TimeSeriesBuilder>,
    kinds_by_point: HashMap<RawPointId, SensorKindId>,
}

impl DatasetIndexBuilder {
    /// Builder with one empty series per column-fed sensor kind.
    ///
    /// Fails if a column feeds an undeclared kind or a kind declares an
    /// invalid measurement mode override.
    pub fn new(config: &InstrumentConfig) -> ResolveResult<Self> {
        let mut series = BTreeMap::new();
        let mut columns = HashMap::new();

        for assignment in &config.columns {
            columns.insert(assignment.column, assignment.kind.clone());
            if series.contains_key(&assignment.kind) {
                continue;
            }

            let mode = config.kind(&assignment.kind)?.mode_override()?;
            let builder =
                TimeSeriesBuilder::new(assignment.kind.clone(), config.columns_for(&assignment.kind))
                    .continuity_threshold(config.continuity_threshold())
                    .split_text_on_change(config.split_text_on_change)
                    .mode_override(mode);
            series.insert(assignment.kind.clone(), builder);
        }

        Ok(Self {
            columns,
            series,
            kinds_by_point: HashMap::new(),
        })
    }

    /// Add one reading to the series of its column's kind
    pub fn add(&mut self, point: RawPoint) -> ResolveResult<()> {
        let kind = self
            .columns
            .get(&point.column)
            .ok_or(ResolveError::UnmappedColumn(point.column))?;
        let builder = self
            .series
            .get_mut(kind)
            .ok_or_else(|| ResolveError::UnknownSensorKind(kind.clone()))?;

        let id = point.id;
        builder.insert(point)?;
        self.kinds_by_point.insert(id, kind.clone());
        Ok(())
    }

    /// Add readings in order, stopping at the first rejected one
    pub fn extend<I: IntoIterator<Item = RawPoint>>(&mut self, points: I) -> ResolveResult<()> {
        for point in points {
            self.add(point)?;
        }
        Ok(())
    }

    /// Apply flag rewrites.
    ///
    /// Every id is checked before any flag changes, so an unknown id leaves
    /// the builder untouched.
    pub fn apply_flag_updates(&mut self, updates: &[FlagUpdate]) -> ResolveResult<()> {
        if let Some(unknown) = updates
            .iter()
            .find(|u| !self.kinds_by_point.contains_key(&u.id))
        {
            return Err(ResolveError::UnknownRawPoint(unknown.id));
        }

        for update in updates {
            let applied = self
                .kinds_by_point
                .get(&update.id)
                .and_then(|kind| self.series.get_mut(kind))
                .map(|builder| builder.set_flag(update.id, update.flag, &update.message))
                .unwrap_or(false);
            if !applied {
                return Err(ResolveError::UnknownRawPoint(update.id));
            }
        }

        log::debug!("Applied {} flag updates", updates.len());
        Ok(())
    }

    /// Number of readings collected
    pub fn len(&self) -> usize {
        self.kinds_by_point.len()
    }

    /// True if no readings have been collected
    pub fn is_empty(&self) -> bool {
        self.kinds_by_point.is_empty()
    }

    /// Freeze every series and build the lookup maps
    pub fn build(self) -> DatasetIndex {
        let series: BTreeMap<SensorKindId, TimeSeries> = self
            .series
            .into_iter()
            .map(|(kind, builder)| (kind, builder.build()))
            .collect();

        let mut by_id = HashMap::new();
        let mut by_column: BTreeMap<ColumnId, Vec<Arc<RawPoint>>> = BTreeMap::new();
        let mut by_time_column = BTreeMap::new();

        for s in series.values() {
            for point in s.points() {
                by_id.insert(point.id, Arc::clone(point));
                by_column.entry(point.column).or_default().push(Arc::clone(point));
                by_time_column.insert((point.time, point.column), Arc::clone(point));
            }
        }
        for points in by_column.values_mut() {
            points.sort_by_key(|p| p.time);
        }

        log::debug!(
            "Dataset index built: {} series, {} readings, {} columns",
            series.len(),
            by_id.len(),
            by_column.len()
        );

        DatasetIndex {
            series,
            by_id,
            by_column,
            by_time_column,
        }
    }
}

/// Frozen, read-only index of one dataset's readings
#[derive(Debug, Clone, Default)]
pub struct DatasetIndex {
    series: BTreeMap<SensorKindId, TimeSeries>,
    by_id: HashMap<RawPointId, Arc<RawPoint>>,
    by_column: BTreeMap<ColumnId, Vec<Arc<RawPoint>>>,
    by_time_column: BTreeMap<(DateTime<Utc>, ColumnId), Arc<RawPoint>>,
}

impl DatasetIndex {
    /// Series of a sensor kind
    pub fn series(&self, kind: &SensorKindId) -> Option<&TimeSeries> {
        self.series.get(kind)
    }

    /// Sensor kinds with a series
    pub fn kinds(&self) -> impl Iterator<Item = &SensorKindId> {
        self.series.keys()
    }

    /// Reading by id
    pub fn point(&self, id: RawPointId) -> Option<&Arc<RawPoint>> {
        self.by_id.get(&id)
    }

    /// Readings of one column in time order
    pub fn column(&self, column: ColumnId) -> &[Arc<RawPoint>] {
        self.by_column.get(&column).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reading of `column` at exactly `time`
    pub fn at(&self, time: DateTime<Utc>, column: ColumnId) -> Option<&Arc<RawPoint>> {
        self.by_time_column.get(&(time, column))
    }

    /// Total number of readings
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True if the index holds no readings
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
