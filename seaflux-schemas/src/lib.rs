//! Instrument definitions for Seaflux
//!
//! ## Overview
//!
//! An instrument definition is the JSON form of
//! [`InstrumentConfig`](seaflux_core::InstrumentConfig): which columns feed
//! which sensor kinds, how kinds nest into parents, and how each variable's
//! required kinds are resolved. This crate parses definitions, checks that
//! the sensor graph they describe is sound, and keeps validated definitions
//! in a [`DefinitionRegistry`].
//!
//! Resolution itself never re-checks the graph. A definition that passed
//! validation cannot send a resolver to an undeclared kind or around a
//! parent/child cycle.
//!
//! ## Definition Format
//!
//! ```json
//! {
//!   "instrument_id": "underway-co2",
//!   "drying_required": true,
//!   "sensor_kinds": [
//!     { "id": "xco2_wet", "requires_calibration": true },
//!     { "id": "eqt", "children": ["eqt_a", "eqt_b"] }
//!   ],
//!   "columns": [ { "column": 1, "kind": "xco2_wet" } ],
//!   "variables": [
//!     {
//!       "name": "underway_marine_pco2",
//!       "core_kind": "xco2_wet",
//!       "required_kinds": ["xco2_wet", "eqt"],
//!       "strategies": {
//!         "eq_pressure": { "type": "summation", "left": "gauge", "right": "ambient" }
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use seaflux_schemas::DefinitionRegistry;
//!
//! let mut registry = DefinitionRegistry::new();
//! registry.load_defaults()?;
//!
//! let config = registry.get("underway-co2")?;
//! assert!(config.variable("underway_marine_pco2").is_some());
//! # Ok::<(), seaflux_schemas::SchemaError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;

use seaflux_core::{InstrumentConfig, ResolveError};
use thiserror::Error;

pub mod registry;
pub mod validation;

pub use registry::DefinitionRegistry;
pub use validation::{validate, IssueKind, ValidationIssue, ValidationReport};

/// Errors raised while loading definitions
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Definition is not valid JSON or does not match the definition shape
    #[error("Definition parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// No definition registered for the instrument
    #[error("Definition not found: {0}")]
    NotFound(String),

    /// Definition parsed but describes an unsound sensor graph
    #[error("Invalid definition {instrument}: {}", join_issues(.issues))]
    Validation {
        /// Instrument the definition describes
        instrument: String,
        /// Every error found
        issues: Vec<ValidationIssue>,
    },

    /// Error reported by the core crate
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Definition file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for definition handling
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Parse a definition and validate it.
///
/// Warnings are logged; errors reject the definition.
pub fn parse_definition(json: &str) -> SchemaResult<InstrumentConfig> {
    let config: InstrumentConfig = serde_json::from_str(json)?;
    let report = validate(&config);
    for warning in &report.warnings {
        log::warn!("Definition {}: {}", config.instrument_id, warning);
    }
    report.into_result(&config.instrument_id)?;
    Ok(config)
}
