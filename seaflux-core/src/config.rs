//! Instrument configuration
//!
//! Describes which columns feed which sensor kinds, how sensor kinds nest, and
//! how each variable's required kinds are resolved. A configuration is an
//! ordinary value passed to every resolver call through
//! [`ResolverContext`](crate::resolver::ResolverContext); nothing here is
//! global.
//!
//! Definitions are usually loaded from JSON by `seaflux-schemas`, which also
//! validates the sensor graph. The builder methods below are for tests and
//! programmatic setups.

use core::fmt;
use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::constants::CONTINUITY_THRESHOLD_SECS;
use crate::errors::{ResolveError, ResolveResult};
use crate::series::MeasurementMode;
use crate::values::ColumnId;

/// Semantic sensor type, e.g. `equilibrator_temperature`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorKindId(String);

impl SensorKindId {
    /// Create an id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorKindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SensorKindId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Declaration of one sensor kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorKind {
    /// Identifier
    pub id: SensorKindId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Child kinds combined into this one (parent/child aggregation)
    #[serde(default)]
    pub children: Vec<SensorKindId>,
    /// Correct drift against external standards after resolution
    #[serde(default)]
    pub requires_calibration: bool,
    /// Force "continuous" or "periodic" instead of detecting it
    #[serde(default)]
    pub measurement_mode: Option<String>,
}

impl SensorKind {
    /// Plain sensor kind with no children and no calibration
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id: SensorKindId::new(id),
            children: Vec::new(),
            requires_calibration: false,
            measurement_mode: None,
        }
    }

    /// Declare child kinds
    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(|c| SensorKindId::new(c)).collect();
        self
    }

    /// Require calibration-offset correction
    pub fn requiring_calibration(mut self) -> Self {
        self.requires_calibration = true;
        self
    }

    /// Force a measurement mode
    pub fn with_mode(mut self, mode: MeasurementMode) -> Self {
        self.measurement_mode = Some(mode.name().to_string());
        self
    }

    /// True if this kind aggregates child kinds
    pub fn is_parent(&self) -> bool {
        !self.children.is_empty()
    }

    /// Parsed measurement mode override
    pub fn mode_override(&self) -> ResolveResult<Option<MeasurementMode>> {
        self.measurement_mode
            .as_deref()
            .map(str::parse::<MeasurementMode>)
            .transpose()
    }
}

/// How a sensor kind's value is produced for a measurement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Strategy {
    /// Exact or interpolated series value, calibration-corrected if required
    Interpolate,
    /// Member-count weighted mean of the child kinds
    Aggregate,
    /// Sum of two kinds
    Summation {
        /// First addend
        left: SensorKindId,
        /// Second addend
        right: SensorKindId,
    },
    /// Wet-basis concentration converted to dry basis
    MoistureCorrection {
        /// Wet-basis concentration kind
        wet: SensorKindId,
        /// Moisture kind, in parts per thousand
        moisture: SensorKindId,
    },
}

/// A calculated variable and the sensor kinds it needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name
    pub name: String,
    /// Kind whose reading defines a measurement; never interpolated
    pub core_kind: SensorKindId,
    /// Kinds resolved for every measurement of this variable
    #[serde(default)]
    pub required_kinds: Vec<SensorKindId>,
    /// Per-kind strategy overrides
    #[serde(default)]
    pub strategies: BTreeMap<SensorKindId, Strategy>,
    /// Run types whose measurements produce this variable. Empty means all.
    #[serde(default)]
    pub run_types: Vec<String>,
}

impl Variable {
    /// Variable with a core kind and no other requirements
    pub fn new(name: impl Into<String>, core_kind: impl Into<String>) -> Self {
        let core_kind = SensorKindId::new(core_kind);
        Self {
            name: name.into(),
            required_kinds: vec![core_kind.clone()],
            core_kind,
            strategies: BTreeMap::new(),
            run_types: Vec::new(),
        }
    }

    /// Add a required kind
    pub fn requiring(mut self, kind: impl Into<String>) -> Self {
        let kind = SensorKindId::new(kind);
        if !self.required_kinds.contains(&kind) {
            self.required_kinds.push(kind);
        }
        self
    }

    /// Assign a strategy to a kind
    pub fn with_strategy(mut self, kind: impl Into<String>, strategy: Strategy) -> Self {
        self.strategies.insert(SensorKindId::new(kind), strategy);
        self
    }

    /// Restrict the variable to measurements of a run type
    pub fn for_run_type(mut self, run_type: impl Into<String>) -> Self {
        self.run_types.push(run_type.into());
        self
    }

    /// True if measurements of `run_type` produce this variable
    pub fn applies_to(&self, run_type: &str) -> bool {
        self.run_types.is_empty() || self.run_types.iter().any(|r| r == run_type)
    }

    /// True if `kind` is this variable's core kind
    pub fn is_core(&self, kind: &SensorKindId) -> bool {
        &self.core_kind == kind
    }
}

/// Column to sensor kind assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAssignment {
    /// Source column
    pub column: ColumnId,
    /// Kind the column supplies
    pub kind: SensorKindId,
}

fn default_continuity_threshold() -> i64 {
    CONTINUITY_THRESHOLD_SECS
}

/// Everything the resolvers need to know about one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Instrument identifier, passed to the calibration source
    pub instrument_id: String,
    /// Column assignments
    #[serde(default)]
    pub columns: Vec<ColumnAssignment>,
    /// Declared sensor kinds
    #[serde(default)]
    pub sensor_kinds: Vec<SensorKind>,
    /// Calculated variables
    #[serde(default)]
    pub variables: Vec<Variable>,
    /// Convert wet-basis concentrations to dry basis
    #[serde(default)]
    pub drying_required: bool,
    /// Largest gap inside one run, seconds
    #[serde(default = "default_continuity_threshold")]
    pub continuity_threshold_secs: i64,
    /// Split textual groups when the value changes during mode detection
    #[serde(default)]
    pub split_text_on_change: bool,
    /// Limit on how far calibration search walks from a measurement, seconds
    #[serde(default)]
    pub max_calibration_search_secs: Option<i64>,
}

impl InstrumentConfig {
    /// Empty configuration with default thresholds
    pub fn new(instrument_id: impl Into<String>) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            columns: Vec::new(),
            sensor_kinds: Vec::new(),
            variables: Vec::new(),
            drying_required: false,
            continuity_threshold_secs: CONTINUITY_THRESHOLD_SECS,
            split_text_on_change: false,
            max_calibration_search_secs: None,
        }
    }

    /// Declare a sensor kind
    pub fn with_kind(mut self, kind: SensorKind) -> Self {
        self.sensor_kinds.push(kind);
        self
    }

    /// Assign a column to a kind
    pub fn with_column(mut self, column: ColumnId, kind: impl Into<String>) -> Self {
        self.columns.push(ColumnAssignment {
            column,
            kind: SensorKindId::new(kind),
        });
        self
    }

    /// Add a variable
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Set the drying attribute
    pub fn with_drying(mut self, drying_required: bool) -> Self {
        self.drying_required = drying_required;
        self
    }

    /// Look up a sensor kind
    pub fn kind(&self, id: &SensorKindId) -> ResolveResult<&SensorKind> {
        self.sensor_kinds
            .iter()
            .find(|k| &k.id == id)
            .ok_or_else(|| ResolveError::UnknownSensorKind(id.clone()))
    }

    /// Kind supplied by a column
    pub fn kind_for_column(&self, column: ColumnId) -> Option<&SensorKindId> {
        self.columns
            .iter()
            .find(|a| a.column == column)
            .map(|a| &a.kind)
    }

    /// Columns supplying a kind
    pub fn columns_for(&self, kind: &SensorKindId) -> Vec<ColumnId> {
        self.columns
            .iter()
            .filter(|a| &a.kind == kind)
            .map(|a| a.column)
            .collect()
    }

    /// Look up a variable by name
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Continuity threshold as a duration
    pub fn continuity_threshold(&self) -> Duration {
        Duration::seconds(self.continuity_threshold_secs)
    }

    /// Calibration search limit as a duration
    pub fn max_calibration_search(&self) -> Option<Duration> {
        self.max_calibration_search_secs.map(Duration::seconds)
    }

    /// Strategy for resolving `kind` within `variable`.
    ///
    /// Explicit assignments win; otherwise parents aggregate and everything
    /// else interpolates.
    pub fn strategy_for(&self, variable: &Variable, kind: &SensorKindId) -> ResolveResult<Strategy> {
        if let Some(strategy) = variable.strategies.get(kind) {
            return Ok(strategy.clone());
        }
        let declared = self.kind(kind)?;
        Ok(if declared.is_parent() {
            Strategy::Aggregate
        } else {
            Strategy::Interpolate
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> InstrumentConfig {
        InstrumentConfig::new("underway")
            .with_kind(SensorKind::new("sst"))
            .with_kind(SensorKind::new("eqt").with_children(["eqt_a", "eqt_b"]))
            .with_kind(SensorKind::new("eqt_a"))
            .with_kind(SensorKind::new("eqt_b"))
            .with_kind(SensorKind::new("co2").requiring_calibration())
            .with_column(ColumnId(1), "sst")
            .with_column(ColumnId(2), "eqt_a")
            .with_column(ColumnId(3), "eqt_b")
            .with_variable(
                Variable::new("underway_pco2", "co2")
                    .requiring("sst")
                    .requiring("eqt"),
            )
    }

    #[test]
    fn default_strategies() {
        let config = config();
        let variable = config.variable("underway_pco2").unwrap();
        assert_eq!(
            config.strategy_for(variable, &"eqt".into()).unwrap(),
            Strategy::Aggregate
        );
        assert_eq!(
            config.strategy_for(variable, &"sst".into()).unwrap(),
            Strategy::Interpolate
        );
        assert!(matches!(
            config.strategy_for(variable, &"missing".into()),
            Err(ResolveError::UnknownSensorKind(_))
        ));
    }

    #[test]
    fn explicit_strategy_wins() {
        let config = config();
        let variable = Variable::new("v", "co2").with_strategy(
            "sst",
            Strategy::Summation {
                left: "eqt_a".into(),
                right: "eqt_b".into(),
            },
        );
        assert!(matches!(
            config.strategy_for(&variable, &"sst".into()).unwrap(),
            Strategy::Summation { .. }
        ));
    }

    #[test]
    fn column_lookup() {
        let config = config();
        assert_eq!(config.kind_for_column(ColumnId(2)), Some(&"eqt_a".into()));
        assert_eq!(config.columns_for(&"sst".into()), vec![ColumnId(1)]);
        assert!(config.kind_for_column(ColumnId(99)).is_none());
    }

    #[test]
    fn mode_override_parses() {
        let kind = SensorKind::new("xco2").with_mode(MeasurementMode::Periodic);
        assert_eq!(kind.mode_override().unwrap(), Some(MeasurementMode::Periodic));

        let mut bad = SensorKind::new("xco2");
        bad.measurement_mode = Some("sometimes".into());
        assert!(matches!(
            bad.mode_override(),
            Err(ResolveError::InvalidMeasurementMode(_))
        ));
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "instrument_id": "gf-1",
            "sensor_kinds": [{ "id": "sst" }],
            "columns": [{ "column": 4, "kind": "sst" }],
            "variables": [{
                "name": "sst_only",
                "core_kind": "sst",
                "strategies": { "sst": { "type": "interpolate" } }
            }]
        }"#;
        let config: InstrumentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.continuity_threshold_secs, 300);
        assert!(!config.drying_required);
        assert_eq!(config.kind_for_column(ColumnId(4)), Some(&"sst".into()));
    }
}
