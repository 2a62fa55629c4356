//! Sensor time-series resolution for Seaflux
//!
//! Turns the raw readings of an oceanographic instrument into the values a
//! measurement needs: the best available reading of every required sensor at
//! the measurement time, interpolated where needed, ranked by QC flag and
//! corrected against calibration standards.
//!
//! Key properties:
//! - Series and indexes are built once, then frozen and shared read-only
//! - "No data" resolves to an explicit empty value, never an error
//! - Resolution of distinct measurements is independent (`parallel` feature)
//!
//! ```rust
//! use seaflux_core::{DatasetIndexBuilder, DatasetMeasurements, ResolverContext};
//! use seaflux_core::config::{InstrumentConfig, SensorKind, Variable};
//! use seaflux_core::index::{Measurement, MeasurementId};
//! use seaflux_core::traits::NoCalibration;
//! use seaflux_core::values::{ColumnId, DatasetId, RawPoint, RawPointId, RawValue};
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let config = InstrumentConfig::new("gf-1")
//!     .with_kind(SensorKind::new("xco2"))
//!     .with_kind(SensorKind::new("sst"))
//!     .with_column(ColumnId(1), "xco2")
//!     .with_column(ColumnId(2), "sst")
//!     .with_variable(Variable::new("pco2", "xco2").requiring("sst"));
//!
//! let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
//! let mut builder = DatasetIndexBuilder::new(&config)?;
//! builder.add(RawPoint::new(RawPointId(1), DatasetId(1), ColumnId(1), t0 + Duration::seconds(30), RawValue::Numeric(402.1)))?;
//! builder.add(RawPoint::new(RawPointId(2), DatasetId(1), ColumnId(2), t0, RawValue::Numeric(14.0)))?;
//! builder.add(RawPoint::new(RawPointId(3), DatasetId(1), ColumnId(2), t0 + Duration::seconds(60), RawValue::Numeric(15.0)))?;
//! let index = builder.build();
//!
//! let measurements = DatasetMeasurements::new(vec![
//!     Measurement::new(MeasurementId(1), t0 + Duration::seconds(30), "SW"),
//! ]);
//! let variable = config.variable("pco2").unwrap();
//! let ctx = ResolverContext::new(&config, variable, &index, &measurements, &NoCalibration);
//!
//! let outcome = ctx.resolve_variable();
//! let sst = outcome.value(MeasurementId(1), &"sst".into()).unwrap();
//! assert_eq!(sst.calculated_value(), 14.5);
//! # Ok::<(), seaflux_core::ResolveError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod derived;
pub mod errors;
pub mod flags;
pub mod index;
pub mod memory;
pub mod pipeline;
pub mod resolver;
pub mod series;
pub mod stats;
pub mod traits;
pub mod values;

// Public API
pub use config::{InstrumentConfig, SensorKind, SensorKindId, Strategy, Variable};
pub use derived::{DerivedPoint, DerivedValue};
pub use errors::{ResolveError, ResolveResult};
pub use flags::QualityFlag;
pub use index::{DatasetIndex, DatasetIndexBuilder, DatasetMeasurements, Measurement, MeasurementId};
pub use pipeline::process_dataset;
pub use resolver::{BatchOutcome, MeasurementValue, ResolutionFailure, ResolverContext};
pub use series::{MeasurementMode, TimeSeries, TimeSeriesBuilder};
pub use traits::{CalibrationSet, CalibrationSource, MeasurementStore, RawValueStore};
pub use values::{FlagUpdate, RawPoint, RawValue};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
