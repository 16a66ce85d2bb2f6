//! Module manifest parsing
//!
//! Handles parsing `module.toml` manifests of extension modules.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::module::definition::ModuleDescriptor;
use crate::module::traits::ModuleError;

fn default_true() -> bool {
    true
}

/// Module manifest (module.toml structure)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Module name
    pub name: String,
    /// Module version (semantic versioning)
    pub version: String,
    /// Human-readable description
    pub description: Option<String>,
    /// Module author
    pub author: Option<String>,
    /// Modules that must be registered before this one
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Whether a failure of this module is fatal to the bootstrap
    #[serde(default)]
    pub critical: bool,
    /// Enabled unless persisted state or configuration says otherwise
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Executable for process-backed modules
    pub entry_point: Option<String>,
}

impl ModuleManifest {
    /// Load manifest from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModuleError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ModuleError::InvalidManifest(format!("Failed to read manifest file: {}", e))
        })?;

        let manifest: ModuleManifest = toml::from_str(&contents).map_err(|e| {
            ModuleError::InvalidManifest(format!("Failed to parse manifest TOML: {}", e))
        })?;

        if manifest.name.is_empty() {
            return Err(ModuleError::InvalidManifest(
                "Module name cannot be empty".to_string(),
            ));
        }
        if matches!(manifest.entry_point.as_deref(), Some("")) {
            return Err(ModuleError::InvalidManifest(
                "Entry point cannot be empty".to_string(),
            ));
        }

        Ok(manifest)
    }

    /// Descriptor for a module living in `directory`
    pub fn to_descriptor(&self, directory: &Path, entry_point: Option<PathBuf>) -> ModuleDescriptor {
        ModuleDescriptor {
            name: self.name.clone(),
            path: directory.to_string_lossy().into_owned(),
            dependencies: self.dependencies.clone(),
            critical: self.critical,
            description: self.description.clone().unwrap_or_default(),
            entry_point,
        }
    }
}
