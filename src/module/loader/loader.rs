//! Module loader implementation
//!
//! Resolves a definition to a constructed module. Initialization and start
//! are separate steps driven by the orchestrator.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::module::definition::ModuleDefinition;
use crate::module::loader::factories::ModuleFactories;
use crate::module::process::ProcessModule;
use crate::module::registry::{DependencyGate, ModuleRegistry};
use crate::module::traits::{Module, ModuleError};

/// Module loader for constructing modules from definitions
#[derive(Debug, Clone)]
pub struct ModuleLoader {
    factories: ModuleFactories,
    /// Base data directory handed to process-backed modules
    data_dir: PathBuf,
}

impl ModuleLoader {
    pub fn new<P: AsRef<Path>>(factories: ModuleFactories, data_dir: P) -> Self {
        Self {
            factories,
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn factories(&self) -> &ModuleFactories {
        &self.factories
    }

    /// Gate-check `definition` against `registry`, then construct it
    pub fn load(
        &self,
        definition: &ModuleDefinition,
        registry: &ModuleRegistry,
    ) -> Result<Box<dyn Module>, ModuleError> {
        DependencyGate::check(definition, registry)?;
        self.construct(definition)
    }

    /// Construct without a dependency check
    ///
    /// Tries a registered factory, then a registered default constructor,
    /// then, for definitions carrying an entry point, a process-backed module.
    pub fn construct(&self, definition: &ModuleDefinition) -> Result<Box<dyn Module>, ModuleError> {
        if let Some(result) = self.factories.construct(&definition.path) {
            debug!("Constructed module {} from {}", definition.name, definition.path);
            return result;
        }

        if let Some(entry_point) = &definition.entry_point {
            let config_path = Path::new(&definition.path).join("config.toml");
            let config = Self::load_module_config(&definition.name, config_path)?;
            debug!(
                "Module {} resolved to executable {:?}",
                definition.name, entry_point
            );
            return Ok(Box::new(ProcessModule::new(
                &definition.name,
                entry_point,
                self.data_dir.join(&definition.name),
                config,
            )));
        }

        Err(ModuleError::LoadError(format!(
            "no factory or default constructor for module {} at {}",
            definition.name, definition.path
        )))
    }

    /// Load a module's `config.toml` as flattened key/value pairs
    ///
    /// Nested tables become dot-separated keys. A missing file yields an
    /// empty map.
    pub fn load_module_config<P: AsRef<Path>>(
        module_name: &str,
        config_path: P,
    ) -> Result<HashMap<String, String>, ModuleError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            debug!("No config file for module {}, using defaults", module_name);
            return Ok(HashMap::new());
        }

        let contents = std::fs::read_to_string(config_path)?;
        let value: toml::Value = toml::from_str(&contents).map_err(|e| {
            ModuleError::InvalidManifest(format!(
                "Failed to parse config for module {}: {}",
                module_name, e
            ))
        })?;

        let mut result = HashMap::new();
        Self::flatten_toml_value(String::new(), &value, &mut result);
        Ok(result)
    }

    fn flatten_toml_value(prefix: String, value: &toml::Value, result: &mut HashMap<String, String>) {
        use toml::Value;

        match value {
            Value::Table(table) => {
                for (key, val) in table {
                    let new_prefix = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    Self::flatten_toml_value(new_prefix, val, result);
                }
            }
            Value::String(s) => {
                result.insert(prefix, s.clone());
            }
            Value::Array(arr) => {
                let values: Vec<String> = arr
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        _ => v.to_string(),
                    })
                    .collect();
                result.insert(prefix, values.join(","));
            }
            other => {
                result.insert(prefix, other.to_string());
            }
        }
    }
}
