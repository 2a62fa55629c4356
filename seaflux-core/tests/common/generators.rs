//! Reading generators
//!
//! Builds raw readings for the two sampling cadences seen on underway
//! instruments: continuous logging and short bursts separated by sleeps.

use chrono::{DateTime, Duration, Utc};

use seaflux_core::config::SensorKindId;
use seaflux_core::values::{ColumnId, DatasetId, RawPointId};
use seaflux_core::{QualityFlag, RawPoint, RawValue, TimeSeries, TimeSeriesBuilder};

/// Dataset id used by all generated readings
pub const DATASET: DatasetId = DatasetId(1);

/// Hands out readings with increasing ids
#[derive(Debug)]
pub struct ReadingGenerator {
    next_id: u64,
    column: ColumnId,
}

impl ReadingGenerator {
    /// Generator for one column, ids starting at `first_id`
    pub fn new(column: u64, first_id: u64) -> Self {
        Self {
            next_id: first_id,
            column: ColumnId(column),
        }
    }

    /// One numeric reading
    pub fn reading(&mut self, time: DateTime<Utc>, value: f64, flag: QualityFlag) -> RawPoint {
        let id = self.next_id;
        self.next_id += 1;
        RawPoint::new(RawPointId(id), DATASET, self.column, time, RawValue::Numeric(value))
            .with_flag(flag, "")
    }

    /// One textual reading
    pub fn text(&mut self, time: DateTime<Utc>, value: &str) -> RawPoint {
        let id = self.next_id;
        self.next_id += 1;
        RawPoint::new(RawPointId(id), DATASET, self.column, time, RawValue::Text(value.into()))
    }

    /// Evenly spaced good readings starting at `start`
    pub fn continuous(
        &mut self,
        start: DateTime<Utc>,
        spacing_secs: i64,
        values: &[f64],
    ) -> Vec<RawPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                self.reading(
                    start + Duration::seconds(spacing_secs * i as i64),
                    *v,
                    QualityFlag::Good,
                )
            })
            .collect()
    }

    /// `bursts` bursts of `size` good readings, `spacing_secs` apart inside a
    /// burst and `sleep_secs` between burst starts. Burst `b` reads `base + b`.
    pub fn bursts(
        &mut self,
        start: DateTime<Utc>,
        bursts: usize,
        size: usize,
        spacing_secs: i64,
        sleep_secs: i64,
        base: f64,
    ) -> Vec<RawPoint> {
        let mut points = Vec::with_capacity(bursts * size);
        for b in 0..bursts {
            let burst_start = start + Duration::seconds(sleep_secs * b as i64);
            for i in 0..size {
                points.push(self.reading(
                    burst_start + Duration::seconds(spacing_secs * i as i64),
                    base + b as f64,
                    QualityFlag::Good,
                ));
            }
        }
        points
    }
}

/// Freeze readings from column 1 into a series of kind `kind`
pub fn series_of(kind: &str, points: Vec<RawPoint>) -> TimeSeries {
    let mut builder = TimeSeriesBuilder::new(SensorKindId::new(kind), [ColumnId(1)]);
    builder.extend(points).expect("generated readings are valid");
    builder.build()
}
