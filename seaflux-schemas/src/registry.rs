//! Registry of validated instrument definitions
//!
//! Definitions are keyed by instrument id. Every definition is validated on
//! the way in, so anything handed out by [`DefinitionRegistry::get`] is safe
//! to resolve against. Registering an id again replaces the old definition.
//!
//! The registry is an ordinary value owned by the caller; there is no global
//! instance.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use include_dir::{include_dir, Dir};
use seaflux_core::InstrumentConfig;

use crate::validation::validate;
use crate::{parse_definition, SchemaError, SchemaResult};

/// Definitions shipped with the crate
static DEFAULT_DEFINITIONS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/definitions");

/// Validated definitions by instrument id
#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    definitions: HashMap<String, InstrumentConfig>,
}

impl DefinitionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a definition
    pub fn register(&mut self, config: InstrumentConfig) -> SchemaResult<()> {
        let report = validate(&config);
        for warning in &report.warnings {
            log::warn!("Definition {}: {}", config.instrument_id, warning);
        }
        report.into_result(&config.instrument_id)?;
        self.insert(config);
        Ok(())
    }

    /// Parse, validate and register a JSON definition. Returns the instrument id.
    pub fn load_str(&mut self, json: &str) -> SchemaResult<String> {
        let config = parse_definition(json)?;
        let id = config.instrument_id.clone();
        self.insert(config);
        Ok(id)
    }

    /// Load a definition file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> SchemaResult<String> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_str(&json)
    }

    /// Load every `*.json` file in a directory, in file name order.
    ///
    /// Stops at the first file that fails; definitions loaded before it stay
    /// registered.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> SchemaResult<Vec<String>> {
        let dir = dir.as_ref();
        let io_err = |source| SchemaError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if is_definition(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        paths.iter().map(|path| self.load_file(path)).collect()
    }

    /// Load the definitions embedded in the crate
    pub fn load_defaults(&mut self) -> SchemaResult<()> {
        for file in DEFAULT_DEFINITIONS.files() {
            if !is_definition(file.path()) {
                continue;
            }
            let json = file.contents_utf8().ok_or_else(|| SchemaError::Io {
                path: file.path().to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, "not UTF-8"),
            })?;
            self.load_str(json)?;
        }
        log::info!("Loaded {} default definitions", self.definitions.len());
        Ok(())
    }

    /// Definition for an instrument
    pub fn get(&self, instrument_id: &str) -> SchemaResult<&InstrumentConfig> {
        self.definitions
            .get(instrument_id)
            .ok_or_else(|| SchemaError::NotFound(instrument_id.to_string()))
    }

    /// Remove a definition, returning it if present
    pub fn remove(&mut self, instrument_id: &str) -> Option<InstrumentConfig> {
        self.definitions.remove(instrument_id)
    }

    /// Registered instrument ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    fn insert(&mut self, config: InstrumentConfig) {
        if self.definitions.contains_key(&config.instrument_id) {
            log::debug!("Replacing definition {}", config.instrument_id);
        }
        self.definitions.insert(config.instrument_id.clone(), config);
    }
}

fn is_definition(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use seaflux_core::config::{SensorKind, Strategy, Variable};
    use seaflux_core::values::ColumnId;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    const SIMPLE: &str = r#"{
        "instrument_id": "simple",
        "sensor_kinds": [{ "id": "xco2" }],
        "columns": [{ "column": 1, "kind": "xco2" }],
        "variables": [{ "name": "pco2", "core_kind": "xco2", "required_kinds": ["xco2"] }]
    }"#;

    #[test]
    fn test_load_defaults() {
        let mut registry = DefinitionRegistry::new();
        registry.load_defaults().unwrap();

        assert_eq!(registry.ids(), vec!["sst-logger", "underway-co2"]);

        let underway = registry.get("underway-co2").unwrap();
        assert!(underway.drying_required);
        let variable = underway.variable("underway_marine_pco2").unwrap();
        assert!(matches!(
            underway.strategy_for(variable, &"xco2_dry".into()).unwrap(),
            Strategy::MoistureCorrection { .. }
        ));
        assert_eq!(
            underway.strategy_for(variable, &"eqt".into()).unwrap(),
            Strategy::Aggregate
        );
        assert!(variable.applies_to("EQU"));
        assert!(!variable.applies_to("STD1"));
    }

    #[test]
    fn test_register_rejects_invalid() {
        let mut registry = DefinitionRegistry::new();
        let config = InstrumentConfig::new("broken")
            .with_kind(SensorKind::new("xco2"))
            .with_column(ColumnId(1), "sst")
            .with_variable(Variable::new("pco2", "xco2"));

        let err = registry.register(config).unwrap_err();
        assert!(matches!(err, SchemaError::Validation { .. }));
        assert!(registry.is_empty());
        assert!(matches!(registry.get("broken"), Err(SchemaError::NotFound(_))));
    }

    #[test]
    fn test_reregister_replaces() {
        let mut registry = DefinitionRegistry::new();
        registry.load_str(SIMPLE).unwrap();
        let replacement = registry.get("simple").unwrap().clone().with_drying(true);
        registry.register(replacement).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.get("simple").unwrap().drying_required);
        assert!(registry.remove("simple").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SIMPLE.as_bytes()).unwrap();

        let mut registry = DefinitionRegistry::new();
        let id = registry.load_file(file.path()).unwrap();
        assert_eq!(id, "simple");
        assert!(registry.get("simple").is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let mut registry = DefinitionRegistry::new();
        let err = registry.load_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SchemaError::Io { .. }));
    }

    #[test]
    fn test_load_dir_skips_other_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b_simple.json"), SIMPLE).unwrap();
        fs::write(
            dir.path().join("a_other.json"),
            SIMPLE.replace("\"simple\"", "\"other\""),
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a definition").unwrap();

        let mut registry = DefinitionRegistry::new();
        let ids = registry.load_dir(dir.path()).unwrap();
        assert_eq!(ids, vec!["other".to_string(), "simple".to_string()]);
        assert_eq!(registry.ids(), vec!["other", "simple"]);
    }

    #[test]
    fn test_load_dir_reports_bad_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), SIMPLE).unwrap();
        fs::write(dir.path().join("b.json"), "{ not json").unwrap();

        let mut registry = DefinitionRegistry::new();
        let err = registry.load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
        assert_eq!(registry.ids(), vec!["simple"]);
    }
}
