//! Structural validation of instrument definitions
//!
//! Checks the sensor graph a definition describes before anything resolves
//! against it. Errors make a definition unusable; warnings point at parts
//! that will resolve but probably not the way the author meant.
//!
//! ## Checks
//!
//! | Check                                   | Severity |
//! |-----------------------------------------|----------|
//! | Duplicate kind, column or variable      | Error    |
//! | Reference to an undeclared kind         | Error    |
//! | Parent/child cycle                      | Error    |
//! | Unknown measurement mode                | Error    |
//! | Non-positive threshold                  | Error    |
//! | Kind with no column, children or recipe | Warning  |
//! | Aggregate assigned to a childless kind  | Warning  |
//! | Core kind missing from required kinds   | Warning  |

use core::fmt;
use std::collections::{BTreeSet, HashMap};

use seaflux_core::config::{SensorKind, SensorKindId, Strategy};
use seaflux_core::InstrumentConfig;

use crate::{SchemaError, SchemaResult};

/// What a validation issue is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Same kind id declared twice
    DuplicateKind,
    /// Same column assigned twice
    DuplicateColumn,
    /// Same variable name declared twice
    DuplicateVariable,
    /// Reference to a kind that is not declared
    UndeclaredKind,
    /// Kind is its own ancestor
    ChildCycle,
    /// Measurement mode is not `continuous` or `periodic`
    InvalidMode,
    /// Threshold is zero or negative
    InvalidThreshold,
    /// Kind has no way of getting a value
    Unsourced,
    /// Aggregate strategy on a kind with no children
    EmptyAggregate,
    /// Variable does not resolve its own core kind
    CoreNotRequired,
}

/// One finding
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Type of issue
    pub kind: IssueKind,
    /// Where in the definition, e.g. `variables[pco2].strategies[eq_pressure]`
    pub field: String,
    /// Human-readable description
    pub message: String,
}

impl ValidationIssue {
    fn new(kind: IssueKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of validating one definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Must be fixed before the definition is used
    pub errors: Vec<ValidationIssue>,
    /// Should be reviewed
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// True if there are no errors
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// True if any error or warning is of `kind`
    pub fn has(&self, kind: IssueKind) -> bool {
        self.errors
            .iter()
            .chain(&self.warnings)
            .any(|issue| issue.kind == kind)
    }

    /// Convert errors into a [`SchemaError::Validation`]
    pub fn into_result(self, instrument: &str) -> SchemaResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SchemaError::Validation {
                instrument: instrument.to_string(),
                issues: self.errors,
            })
        }
    }

    fn error(&mut self, kind: IssueKind, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue::new(kind, field, message));
    }

    fn warning(&mut self, kind: IssueKind, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue::new(kind, field, message));
    }
}

/// Validate a parsed definition
pub fn validate(config: &InstrumentConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    let kinds = declared_kinds(config, &mut report);
    check_thresholds(config, &mut report);
    check_columns(config, &kinds, &mut report);
    check_kinds(config, &kinds, &mut report);
    check_variables(config, &kinds, &mut report);
    check_sources(config, &mut report);

    if let Some(cycle) = find_cycle(&kinds) {
        let path: Vec<&str> = cycle.iter().map(|k| k.as_str()).collect();
        report.error(
            IssueKind::ChildCycle,
            format!("sensor_kinds[{}].children", path[0]),
            format!("parent/child cycle {}", path.join(" -> ")),
        );
    }

    report
}

fn declared_kinds<'a>(
    config: &'a InstrumentConfig,
    report: &mut ValidationReport,
) -> HashMap<&'a SensorKindId, &'a SensorKind> {
    let mut kinds = HashMap::new();
    for kind in &config.sensor_kinds {
        if kinds.insert(&kind.id, kind).is_some() {
            report.error(
                IssueKind::DuplicateKind,
                format!("sensor_kinds[{}]", kind.id),
                "declared more than once",
            );
        }
    }
    kinds
}

fn check_thresholds(config: &InstrumentConfig, report: &mut ValidationReport) {
    if config.continuity_threshold_secs <= 0 {
        report.error(
            IssueKind::InvalidThreshold,
            "continuity_threshold_secs",
            format!("must be positive, got {}", config.continuity_threshold_secs),
        );
    }
    if let Some(limit) = config.max_calibration_search_secs.filter(|s| *s <= 0) {
        report.error(
            IssueKind::InvalidThreshold,
            "max_calibration_search_secs",
            format!("must be positive, got {}", limit),
        );
    }
}

fn check_columns(
    config: &InstrumentConfig,
    kinds: &HashMap<&SensorKindId, &SensorKind>,
    report: &mut ValidationReport,
) {
    let mut seen = BTreeSet::new();
    for assignment in &config.columns {
        let field = format!("columns[{}]", assignment.column);
        if !seen.insert(assignment.column) {
            report.error(IssueKind::DuplicateColumn, &field, "assigned more than once");
        }
        if !kinds.contains_key(&assignment.kind) {
            report.error(
                IssueKind::UndeclaredKind,
                field,
                format!("mapped to undeclared kind {}", assignment.kind),
            );
        }
    }
}

fn check_kinds(
    config: &InstrumentConfig,
    kinds: &HashMap<&SensorKindId, &SensorKind>,
    report: &mut ValidationReport,
) {
    for kind in &config.sensor_kinds {
        for child in &kind.children {
            if !kinds.contains_key(child) {
                report.error(
                    IssueKind::UndeclaredKind,
                    format!("sensor_kinds[{}].children", kind.id),
                    format!("undeclared child {}", child),
                );
            }
        }
        if let Err(err) = kind.mode_override() {
            report.error(
                IssueKind::InvalidMode,
                format!("sensor_kinds[{}].measurement_mode", kind.id),
                err.to_string(),
            );
        }
    }
}

fn check_variables(
    config: &InstrumentConfig,
    kinds: &HashMap<&SensorKindId, &SensorKind>,
    report: &mut ValidationReport,
) {
    let mut names = BTreeSet::new();
    for variable in &config.variables {
        let base = format!("variables[{}]", variable.name);
        if !names.insert(variable.name.as_str()) {
            report.error(IssueKind::DuplicateVariable, &base, "declared more than once");
        }

        let require = |field: String, kind: &SensorKindId, report: &mut ValidationReport| {
            if !kinds.contains_key(kind) {
                report.error(IssueKind::UndeclaredKind, field, format!("undeclared kind {}", kind));
            }
        };

        require(format!("{}.core_kind", base), &variable.core_kind, report);
        for kind in &variable.required_kinds {
            require(format!("{}.required_kinds", base), kind, report);
        }
        if !variable.required_kinds.contains(&variable.core_kind) {
            report.warning(
                IssueKind::CoreNotRequired,
                format!("{}.required_kinds", base),
                format!("core kind {} is never resolved", variable.core_kind),
            );
        }

        for (target, strategy) in &variable.strategies {
            let field = format!("{}.strategies[{}]", base, target);
            require(field.clone(), target, report);
            match strategy {
                Strategy::Interpolate => {}
                Strategy::Aggregate => {
                    let childless = kinds.get(target).is_some_and(|k| !k.is_parent());
                    if childless {
                        report.warning(
                            IssueKind::EmptyAggregate,
                            &field,
                            "aggregates a kind with no children",
                        );
                    }
                }
                Strategy::Summation { left, right } => {
                    require(field.clone(), left, report);
                    require(field, right, report);
                }
                Strategy::MoistureCorrection { wet, moisture } => {
                    require(field.clone(), wet, report);
                    require(field, moisture, report);
                }
            }
        }
    }
}

/// Kinds with no column, no children and no composite recipe never have data
fn check_sources(config: &InstrumentConfig, report: &mut ValidationReport) {
    let mapped: BTreeSet<&SensorKindId> = config.columns.iter().map(|c| &c.kind).collect();
    let derived: BTreeSet<&SensorKindId> = config
        .variables
        .iter()
        .flat_map(|v| v.strategies.iter())
        .filter(|(_, strategy)| {
            matches!(
                strategy,
                Strategy::Summation { .. } | Strategy::MoistureCorrection { .. }
            )
        })
        .map(|(target, _)| target)
        .collect();

    for kind in &config.sensor_kinds {
        if !kind.is_parent() && !mapped.contains(&kind.id) && !derived.contains(&kind.id) {
            report.warning(
                IssueKind::Unsourced,
                format!("sensor_kinds[{}]", kind.id),
                "no column, children or composite strategy supplies this kind",
            );
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Done,
}

fn find_cycle<'a>(kinds: &HashMap<&'a SensorKindId, &'a SensorKind>) -> Option<Vec<&'a SensorKindId>> {
    let mut roots: Vec<&SensorKindId> = kinds.keys().copied().collect();
    roots.sort();

    let mut marks = HashMap::new();
    let mut path = Vec::new();
    roots
        .into_iter()
        .find_map(|root| visit(root, kinds, &mut marks, &mut path))
}

fn visit<'a>(
    id: &'a SensorKindId,
    kinds: &HashMap<&'a SensorKindId, &'a SensorKind>,
    marks: &mut HashMap<&'a SensorKindId, Mark>,
    path: &mut Vec<&'a SensorKindId>,
) -> Option<Vec<&'a SensorKindId>> {
    match marks.get(id) {
        Some(Mark::Done) => return None,
        Some(Mark::Visiting) => {
            let start = path.iter().position(|p| *p == id).unwrap_or(0);
            let mut cycle = path[start..].to_vec();
            cycle.push(id);
            return Some(cycle);
        }
        None => {}
    }

    marks.insert(id, Mark::Visiting);
    path.push(id);
    if let Some(kind) = kinds.get(id).copied() {
        for child in &kind.children {
            if let Some(cycle) = visit(child, kinds, marks, path) {
                return Some(cycle);
            }
        }
    }
    path.pop();
    marks.insert(id, Mark::Done);
    None
}
