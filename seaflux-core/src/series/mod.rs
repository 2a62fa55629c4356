//! Sensor Time Series
//!
//! ## Overview
//!
//! A [`TimeSeries`] holds every raw reading of one sensor kind, possibly
//! gathered from several equivalent columns, in strictly increasing time
//! order. From those readings it derives the measurement mode and the list of
//! derived points that all queries run against.
//!
//! ## Build, Then Freeze
//!
//! Series are assembled with a [`TimeSeriesBuilder`]. The builder rejects
//! duplicate timestamps and foreign columns, and accepts flag rewrites from
//! flushing detection. [`TimeSeriesBuilder::build`] consumes the builder and
//! computes mode and outputs exactly once:
//!
//! ```text
//! insert / extend / set_flag          build()          value_at / value_in_window
//! ─────────── TimeSeriesBuilder ──────────► TimeSeries ─────────────────────────►
//!             (mutable, validated)          (immutable, shared read-only)
//! ```
//!
//! A frozen series never changes, so there is no derived state to invalidate
//! and it can be queried from many threads at once.
//!
//! ## Usage Example
//!
//! ```rust
//! use seaflux_core::{TimeSeriesBuilder, RawPoint, RawValue, MeasurementMode};
//! use seaflux_core::values::{ColumnId, DatasetId, RawPointId};
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
//! let mut builder = TimeSeriesBuilder::new("sst".into(), [ColumnId(3)]);
//! for i in 0..5 {
//!     builder.insert(RawPoint::new(
//!         RawPointId(i),
//!         DatasetId(1),
//!         ColumnId(3),
//!         start + Duration::seconds(60 * i as i64),
//!         RawValue::Numeric(12.0 + i as f64 * 0.1),
//!     ))?;
//! }
//!
//! let series = builder.build();
//! assert_eq!(series.mode(), MeasurementMode::Continuous);
//!
//! let value = series.value_at(start + Duration::seconds(90), true)?.unwrap();
//! assert!((value.numeric()? - 12.15).abs() < 1e-9);
//! # Ok::<(), seaflux_core::ResolveError>(())
//! ```

pub mod averaging;
pub mod mode;
pub mod output;
mod search;

pub use mode::MeasurementMode;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::config::SensorKindId;
use crate::constants::time::continuity_threshold;
use crate::derived::DerivedPoint;
use crate::errors::{ResolveError, ResolveResult};
use crate::flags::QualityFlag;
use crate::values::{ColumnId, RawPoint, RawPointId, ValueKind};

/// Mutable, validating collector for one sensor kind's readings
#[derive(Debug, Clone)]
pub struct TimeSeriesBuilder {
    kind: SensorKindId,
    columns: BTreeSet<ColumnId>,
    points: BTreeMap<DateTime<Utc>, RawPoint>,
    times_by_id: HashMap<RawPointId, DateTime<Utc>>,
    value_kind: Option<ValueKind>,
    continuity_threshold: Duration,
    split_text_on_change: bool,
    mode_override: Option<MeasurementMode>,
}

impl TimeSeriesBuilder {
    /// Builder for `kind`, accepting readings from `columns`
    pub fn new<I: IntoIterator<Item = ColumnId>>(kind: SensorKindId, columns: I) -> Self {
        Self {
            kind,
            columns: columns.into_iter().collect(),
            points: BTreeMap::new(),
            times_by_id: HashMap::new(),
            value_kind: None,
            continuity_threshold: continuity_threshold(),
            split_text_on_change: false,
            mode_override: None,
        }
    }

    /// Largest gap that still counts as one run
    pub fn continuity_threshold(mut self, threshold: Duration) -> Self {
        self.continuity_threshold = threshold;
        self
    }

    /// Let text value changes close groups during mode detection
    pub fn split_text_on_change(mut self, enabled: bool) -> Self {
        self.split_text_on_change = enabled;
        self
    }

    /// Use a fixed mode instead of detecting one
    pub fn mode_override(mut self, mode: Option<MeasurementMode>) -> Self {
        self.mode_override = mode;
        self
    }

    /// Sensor kind of the series
    pub fn kind(&self) -> &SensorKindId {
        &self.kind
    }

    /// Number of readings collected
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if no readings have been collected
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn check(&self, point: &RawPoint, value_kind: Option<ValueKind>) -> ResolveResult<()> {
        if !self.columns.contains(&point.column) {
            return Err(ResolveError::ColumnMismatch {
                column: point.column,
                kind: self.kind.clone(),
            });
        }
        if self.points.contains_key(&point.time) {
            return Err(ResolveError::DuplicateTimestamp {
                kind: self.kind.clone(),
                time: point.time,
            });
        }
        match (value_kind, point.value.kind()) {
            (_, ValueKind::Absent) | (None, _) => Ok(()),
            (Some(expected), found) if expected == found => Ok(()),
            (Some(expected), found) => Err(ResolveError::ValueTypeMismatch { expected, found }),
        }
    }

    fn merged_kind(current: Option<ValueKind>, point: &RawPoint) -> Option<ValueKind> {
        match point.value.kind() {
            ValueKind::Absent => current,
            kind => current.or(Some(kind)),
        }
    }

    /// Insert one reading.
    ///
    /// Fails without changing the builder if the time is already taken, the
    /// column does not supply this kind, or the value type differs from the
    /// readings already collected.
    pub fn insert(&mut self, point: RawPoint) -> ResolveResult<()> {
        self.check(&point, self.value_kind)?;
        self.value_kind = Self::merged_kind(self.value_kind, &point);
        self.times_by_id.insert(point.id, point.time);
        self.points.insert(point.time, point);
        Ok(())
    }

    /// Insert a batch of readings atomically.
    ///
    /// Either every reading is inserted or, on the first violation, none is.
    pub fn extend<I: IntoIterator<Item = RawPoint>>(&mut self, points: I) -> ResolveResult<()> {
        let points: Vec<RawPoint> = points.into_iter().collect();
        let mut batch_times = BTreeSet::new();
        let mut value_kind = self.value_kind;

        for point in &points {
            self.check(point, value_kind)?;
            if !batch_times.insert(point.time) {
                return Err(ResolveError::DuplicateTimestamp {
                    kind: self.kind.clone(),
                    time: point.time,
                });
            }
            value_kind = Self::merged_kind(value_kind, point);
        }

        self.value_kind = value_kind;
        for point in points {
            self.times_by_id.insert(point.id, point.time);
            self.points.insert(point.time, point);
        }
        Ok(())
    }

    /// Rewrite the flag of a collected reading. Returns false if `id` is not
    /// in this builder.
    pub fn set_flag(&mut self, id: RawPointId, flag: QualityFlag, message: &str) -> bool {
        let Some(time) = self.times_by_id.get(&id) else {
            return false;
        };
        match self.points.get_mut(time) {
            Some(point) => {
                point.set_flag(flag, message);
                true
            }
            None => false,
        }
    }

    /// Freeze the series, computing its mode and derived points
    pub fn build(self) -> TimeSeries {
        let textual = self.value_kind == Some(ValueKind::Text);
        let points: Vec<Arc<RawPoint>> = self.points.into_values().map(Arc::new).collect();

        let mode = self.mode_override.unwrap_or_else(|| {
            let usable: Vec<Arc<RawPoint>> =
                points.iter().filter(|p| p.is_usable()).cloned().collect();
            mode::detect(
                &usable,
                self.continuity_threshold,
                self.split_text_on_change && textual,
            )
        });
        let outputs = output::build(&points, mode, self.continuity_threshold, textual);

        log::debug!(
            "Built series {}: {} readings, {} mode, {} output values",
            self.kind,
            points.len(),
            mode,
            outputs.len()
        );

        TimeSeries {
            kind: self.kind,
            points,
            textual,
            continuity_threshold: self.continuity_threshold,
            mode,
            outputs,
        }
    }
}

/// Immutable series of one sensor kind's readings with derived outputs
#[derive(Debug, Clone)]
pub struct TimeSeries {
    kind: SensorKindId,
    points: Vec<Arc<RawPoint>>,
    textual: bool,
    continuity_threshold: Duration,
    mode: MeasurementMode,
    outputs: Vec<DerivedPoint>,
}

impl TimeSeries {
    /// Sensor kind
    pub fn kind(&self) -> &SensorKindId {
        &self.kind
    }

    /// Raw readings in time order
    pub fn points(&self) -> &[Arc<RawPoint>] {
        &self.points
    }

    /// Number of raw readings
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the series holds no readings
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True if the series holds textual readings
    pub fn is_textual(&self) -> bool {
        self.textual
    }

    /// Detected or configured measurement mode
    pub fn mode(&self) -> MeasurementMode {
        self.mode
    }

    /// Continuity threshold the series was built with
    pub fn continuity_threshold(&self) -> Duration {
        self.continuity_threshold
    }

    /// Derived points in time order
    pub fn values(&self) -> &[DerivedPoint] {
        &self.outputs
    }

    /// Raw reading at exactly `time`
    pub fn raw_at(&self, time: DateTime<Utc>) -> Option<&Arc<RawPoint>> {
        self.points
            .binary_search_by(|p| p.time.cmp(&time))
            .ok()
            .map(|i| &self.points[i])
    }

    /// Raw readings with `start <= time <= end`
    pub fn raw_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> &[Arc<RawPoint>] {
        let lo = self.points.partition_point(|p| p.time < start);
        let hi = self.points.partition_point(|p| p.time <= end);
        if lo >= hi {
            return &[];
        }
        &self.points[lo..hi]
    }
}
