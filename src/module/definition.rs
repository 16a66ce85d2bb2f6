//! Module definitions
//!
//! The static definition table for core modules and the descriptor type the
//! "modules" service returns for discovered extensions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reserved name of the logging module (triggers the logger upgrade)
pub const LOGGER_MODULE: &str = "logger";
/// Reserved name of the module discovery/registration service
pub const MODULES_SERVICE: &str = "modules";
/// Reserved name of the CLI module
pub const CLI_MODULE: &str = "cli";

/// Kind of module, informational only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    /// Runtime infrastructure (logging)
    Core,
    /// Shared service other modules depend on
    Service,
    /// User-facing surface (CLI)
    Interface,
    /// Third-party module found by discovery
    Extension,
}

/// Immutable description of one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    /// Unique module name
    pub name: String,
    /// Load path used to resolve the module's factory
    pub path: String,
    /// Modules that must already be registered before this one loads
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Failure at any lifecycle step aborts the bootstrap
    #[serde(default)]
    pub critical: bool,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    #[serde(default)]
    pub description: String,
    /// Executable for process-backed extensions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<PathBuf>,
}

impl ModuleDefinition {
    pub fn new(name: impl Into<String>, path: impl Into<String>, module_type: ModuleType) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            dependencies: Vec::new(),
            critical: false,
            module_type,
            description: String::new(),
            entry_point: None,
        }
    }

    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Module descriptor reported by the "modules" service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<PathBuf>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            dependencies: Vec::new(),
            critical: false,
            description: String::new(),
            entry_point: None,
        }
    }

    /// Definition the loader understands
    pub fn to_definition(&self) -> ModuleDefinition {
        ModuleDefinition {
            name: self.name.clone(),
            path: self.path.clone(),
            dependencies: self.dependencies.clone(),
            critical: self.critical,
            module_type: ModuleType::Extension,
            description: self.description.clone(),
            entry_point: self.entry_point.clone(),
        }
    }
}

/// Core module table, in trusted load order
pub fn default_core_definitions() -> Vec<ModuleDefinition> {
    vec![
        ModuleDefinition::new(LOGGER_MODULE, "core/logger", ModuleType::Core)
            .critical(true)
            .describe("Structured logging for the runtime and every module"),
        ModuleDefinition::new(MODULES_SERVICE, "core/modules", ModuleType::Service)
            .depends_on([LOGGER_MODULE])
            .critical(true)
            .describe("Module discovery, enablement and registration records"),
        ModuleDefinition::new(CLI_MODULE, "core/cli", ModuleType::Interface)
            .depends_on([LOGGER_MODULE, MODULES_SERVICE])
            .describe("Command registration for loaded modules"),
    ]
}
