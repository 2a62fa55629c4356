//! Error Types for Series Construction and Value Resolution
//!
//! ## Error Categories
//!
//! ### Structural Violations
//! Raised while a series or dataset index is being built. They mean the
//! upstream data is malformed and are returned to the caller immediately:
//! - `DuplicateTimestamp`: two raw points for one sensor kind share a time
//! - `ColumnMismatch`: a point's column does not feed the series' sensor kind
//! - `UnmappedColumn`: a point's column is not assigned to any sensor kind
//! - `UnknownRawPoint`: a flag update names a point that was never inserted
//!
//! ### Access Violations
//! - `ValueTypeMismatch`: numeric accessor used on a textual value or the
//!   reverse
//!
//! ### Internal Defects
//! These should be unreachable. Seeing one means a logic error, not bad data:
//! - `InvalidMeasurementMode`
//! - `UnexpectedCandidateCount`
//! - `ResolutionDepthExceeded`
//!
//! ### Collaborator Failures
//! - `Calibration`: the calibration source could not supply a set
//! - `Store`: a raw value or measurement store failed
//!
//! "No data available" is never an error. Resolution of a sensor kind with no
//! usable values produces an empty [`MeasurementValue`](crate::resolver::MeasurementValue)
//! instead, so one missing sensor cannot abort a whole dataset.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use seaflux_core::{ResolveError, TimeSeriesBuilder, RawPoint, RawValue};
//! use seaflux_core::config::SensorKindId;
//! use seaflux_core::values::{ColumnId, DatasetId, RawPointId};
//! use chrono::{TimeZone, Utc};
//!
//! let kind = SensorKindId::new("sst");
//! let mut builder = TimeSeriesBuilder::new(kind, [ColumnId(1)]);
//! let t = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
//!
//! builder.insert(RawPoint::new(RawPointId(1), DatasetId(1), ColumnId(1), t, RawValue::Numeric(12.1)))?;
//! match builder.insert(RawPoint::new(RawPointId(2), DatasetId(1), ColumnId(1), t, RawValue::Numeric(12.2))) {
//!     Err(ResolveError::DuplicateTimestamp { .. }) => {
//!         // Reject the file that produced the second reading
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! # Ok::<(), ResolveError>(())
//! ```

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::SensorKindId;
use crate::values::{ColumnId, RawPointId, ValueKind};

/// Result type for series construction and resolution
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors raised while building series or resolving measurement values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// A point with this timestamp already exists in the series
    #[error("Duplicate timestamp {time} in series for sensor kind {kind}")]
    DuplicateTimestamp {
        /// Sensor kind of the series that rejected the point
        kind: SensorKindId,
        /// The clashing timestamp
        time: DateTime<Utc>,
    },

    /// The point's column does not belong to the series' sensor kind
    #[error("Column {column} does not supply sensor kind {kind}")]
    ColumnMismatch {
        /// Column of the rejected point
        column: ColumnId,
        /// Sensor kind of the series
        kind: SensorKindId,
    },

    /// The point's column is not assigned to any sensor kind
    #[error("Column {0} is not assigned to a sensor kind")]
    UnmappedColumn(ColumnId),

    /// Value accessed as the wrong type
    #[error("Expected a {expected} value, found {found}")]
    ValueTypeMismatch {
        /// Type the caller asked for
        expected: ValueKind,
        /// Type actually held
        found: ValueKind,
    },

    /// Measurement mode string was neither continuous nor periodic
    #[error("Invalid measurement mode '{0}'")]
    InvalidMeasurementMode(String),

    /// Interpolation search produced a number of candidates other than 0, 1 or 2
    #[error("Interpolation search produced {count} candidates")]
    UnexpectedCandidateCount {
        /// Number of candidates found
        count: usize,
    },

    /// Sensor kind is not declared in the instrument configuration
    #[error("Unknown sensor kind {0}")]
    UnknownSensorKind(SensorKindId),

    /// Variable is not declared in the instrument configuration
    #[error("Unknown variable {0}")]
    UnknownVariable(String),

    /// Flag update for a raw point that was never inserted
    #[error("Unknown raw point {0}")]
    UnknownRawPoint(RawPointId),

    /// Nested resolution went deeper than the sensor graph allows
    #[error("Resolution of {kind} exceeded maximum depth {max_depth}")]
    ResolutionDepthExceeded {
        /// Kind being resolved when the limit was hit
        kind: SensorKindId,
        /// Configured nesting limit
        max_depth: usize,
    },

    /// Calibration source failed to provide a calibration set
    #[error("Calibration lookup failed: {0}")]
    Calibration(String),

    /// Raw value or measurement store failed
    #[error("Store error: {0}")]
    Store(String),
}

impl ResolveError {
    /// True for errors caused by malformed upstream data
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTimestamp { .. }
                | Self::ColumnMismatch { .. }
                | Self::UnmappedColumn(_)
                | Self::UnknownRawPoint(_)
        )
    }

    /// True for errors that indicate a defect in this crate
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::InvalidMeasurementMode(_)
                | Self::UnexpectedCandidateCount { .. }
                | Self::ResolutionDepthExceeded { .. }
        )
    }
}
