//! Measurement Value Resolution
//!
//! ## Overview
//!
//! For one measurement and one required sensor kind, a resolver produces a
//! [`MeasurementValue`]: the calculated number, the raw readings it came from,
//! any calibration readings used to correct it, and the combined QC flag.
//!
//! ## Strategies
//!
//! Every kind resolves through exactly one [`Strategy`], chosen by
//! [`InstrumentConfig::strategy_for`] and matched exhaustively here:
//!
//! | Strategy             | Module          | Result                                  |
//! |----------------------|-----------------|-----------------------------------------|
//! | `Interpolate`        | [`interpolate`] | series value, calibration-corrected     |
//! | `Aggregate`          | [`aggregate`]   | member-weighted mean of child kinds     |
//! | `Summation`          | [`composite`]   | sum of two kinds                        |
//! | `MoistureCorrection` | [`composite`]   | wet-basis value converted to dry basis  |
//!
//! Aggregates and composites call back into [`ResolverContext::resolve`]
//! for their inputs, so a child kind may itself be calibration-corrected.
//! Nesting is capped at [`MAX_RESOLUTION_DEPTH`].
//!
//! ## No Data Is Not An Error
//!
//! A kind with no usable readings resolves to [`MeasurementValue::empty`]
//! (NaN, zero members). Errors are reserved for defects and collaborator
//! failures; batch resolution records those per value and carries on.

pub mod aggregate;
pub mod batch;
pub mod calibration;
pub mod composite;
pub mod interpolate;

pub use batch::{BatchOutcome, ResolutionFailure};

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::{InstrumentConfig, SensorKindId, Strategy, Variable};
use crate::constants::MAX_RESOLUTION_DEPTH;
use crate::derived::DerivedPoint;
use crate::errors::{ResolveError, ResolveResult};
use crate::flags::QualityFlag;
use crate::index::{DatasetIndex, DatasetMeasurements, Measurement, MeasurementId};
use crate::traits::CalibrationSource;
use crate::values::{RawPoint, RawPointId};

/// Calculated value of one sensor kind for one measurement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementValue {
    measurement_id: MeasurementId,
    kind: SensorKindId,
    calculated_value: f64,
    contributing: BTreeSet<RawPointId>,
    supporting: BTreeSet<RawPointId>,
    flag: QualityFlag,
    messages: Vec<String>,
    member_count: usize,
    interpolates_across_flags: bool,
}

impl MeasurementValue {
    /// No value: NaN, no provenance, neutral flag
    pub fn empty(measurement_id: MeasurementId, kind: SensorKindId) -> Self {
        Self {
            measurement_id,
            kind,
            calculated_value: f64::NAN,
            contributing: BTreeSet::new(),
            supporting: BTreeSet::new(),
            flag: QualityFlag::AssumedGood,
            messages: Vec::new(),
            member_count: 0,
            interpolates_across_flags: false,
        }
    }

    /// Value taken from a numeric derived point
    pub(crate) fn from_derived(
        measurement_id: MeasurementId,
        kind: SensorKindId,
        point: &DerivedPoint,
    ) -> ResolveResult<Self> {
        Ok(Self {
            measurement_id,
            kind,
            calculated_value: point.numeric()?,
            contributing: point.sources().clone(),
            supporting: BTreeSet::new(),
            flag: point.flag(),
            messages: message_list(point.message()),
            member_count: point.member_count(),
            interpolates_across_flags: point.interpolates_across_flags(),
        })
    }

    /// Value taken directly from one raw reading
    pub(crate) fn from_raw(
        measurement_id: MeasurementId,
        kind: SensorKindId,
        point: &RawPoint,
    ) -> ResolveResult<Self> {
        Ok(Self {
            measurement_id,
            kind,
            calculated_value: point.numeric()?,
            contributing: BTreeSet::from([point.id]),
            supporting: BTreeSet::new(),
            flag: point.effective_flag(),
            messages: message_list(&point.message),
            member_count: 1,
            interpolates_across_flags: false,
        })
    }

    /// Value combined from several inputs
    pub(crate) fn combined<'a, I>(
        measurement_id: MeasurementId,
        kind: SensorKindId,
        calculated_value: f64,
        inputs: I,
    ) -> Self
    where
        I: IntoIterator<Item = &'a MeasurementValue>,
    {
        let mut value = Self::empty(measurement_id, kind);
        value.calculated_value = calculated_value;
        let mut flag = None;

        for input in inputs {
            value.contributing.extend(input.contributing.iter().copied());
            value.supporting.extend(input.supporting.iter().copied());
            for message in &input.messages {
                if !value.messages.contains(message) {
                    value.messages.push(message.clone());
                }
            }
            value.member_count += input.member_count;
            value.interpolates_across_flags |= input.interpolates_across_flags;
            flag = Some(flag.map_or(input.flag, |f: QualityFlag| f.combine(input.flag)));
        }

        value.flag = flag.unwrap_or(QualityFlag::AssumedGood);
        value
    }

    /// Same value relabelled for another kind
    pub(crate) fn relabelled(mut self, kind: SensorKindId) -> Self {
        self.kind = kind;
        self
    }

    /// Copy with a corrected value and the calibration readings behind it
    pub(crate) fn corrected(mut self, value: f64, supporting: BTreeSet<RawPointId>) -> Self {
        self.calculated_value = value;
        self.supporting.extend(supporting);
        self
    }

    /// Measurement the value belongs to
    pub fn measurement_id(&self) -> MeasurementId {
        self.measurement_id
    }

    /// Sensor kind
    pub fn kind(&self) -> &SensorKindId {
        &self.kind
    }

    /// Calculated value, NaN when there is none
    pub fn calculated_value(&self) -> f64 {
        self.calculated_value
    }

    /// Raw readings the value was calculated from
    pub fn contributing(&self) -> &BTreeSet<RawPointId> {
        &self.contributing
    }

    /// Calibration readings used to correct the value
    pub fn supporting(&self) -> &BTreeSet<RawPointId> {
        &self.supporting
    }

    /// Combined QC flag
    pub fn flag(&self) -> QualityFlag {
        self.flag
    }

    /// QC messages of the contributing readings
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Raw readings folded into the value, used as an averaging weight
    pub fn member_count(&self) -> usize {
        self.member_count
    }

    /// True if a better or differently flagged reading was passed over
    pub fn interpolates_across_flags(&self) -> bool {
        self.interpolates_across_flags
    }

    /// True if there is a calculated value
    pub fn has_value(&self) -> bool {
        self.member_count > 0 && !self.calculated_value.is_nan()
    }
}

fn message_list(message: &str) -> Vec<String> {
    message
        .split("; ")
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

/// Everything a resolver reads, passed explicitly to every call
#[derive(Clone, Copy)]
pub struct ResolverContext<'a> {
    /// Instrument configuration
    pub config: &'a InstrumentConfig,
    /// Variable being calculated
    pub variable: &'a Variable,
    /// Frozen raw readings
    pub index: &'a DatasetIndex,
    /// Located measurements
    pub measurements: &'a DatasetMeasurements,
    /// Calibration-set lookup
    pub calibration: &'a dyn CalibrationSource,
}

impl<'a> ResolverContext<'a> {
    /// Context for one variable
    pub fn new(
        config: &'a InstrumentConfig,
        variable: &'a Variable,
        index: &'a DatasetIndex,
        measurements: &'a DatasetMeasurements,
        calibration: &'a dyn CalibrationSource,
    ) -> Self {
        Self {
            config,
            variable,
            index,
            measurements,
            calibration,
        }
    }

    /// Resolve `kind` for `measurement`
    pub fn resolve(&self, measurement: &Measurement, kind: &SensorKindId) -> ResolveResult<MeasurementValue> {
        self.resolve_nested(measurement, kind, 0)
    }

    /// Resolve an input of a composite strategy running at `depth`
    pub(crate) fn resolve_nested(
        &self,
        measurement: &Measurement,
        kind: &SensorKindId,
        depth: usize,
    ) -> ResolveResult<MeasurementValue> {
        if depth > MAX_RESOLUTION_DEPTH {
            return Err(ResolveError::ResolutionDepthExceeded {
                kind: kind.clone(),
                max_depth: MAX_RESOLUTION_DEPTH,
            });
        }

        match self.config.strategy_for(self.variable, kind)? {
            Strategy::Interpolate => interpolate::resolve(self, measurement, kind),
            Strategy::Aggregate => aggregate::resolve(self, measurement, kind, depth),
            Strategy::Summation { left, right } => {
                composite::summation(self, measurement, kind, (&left, &right), depth)
            }
            Strategy::MoistureCorrection { wet, moisture } => {
                composite::moisture_correction(self, measurement, kind, (&wet, &moisture), depth)
            }
        }
    }
}
