//! Built-in "modules" service
//!
//! Combines filesystem discovery with a persisted state file
//! (`<data_dir>/modules.json`) recording every known module, its enabled flag,
//! and whether it is a core module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::module::definition::ModuleDescriptor;
use crate::module::registry::ModuleDiscovery;
use crate::module::traits::{Capabilities, HealthStatus, Module, ModuleError, ModuleService};

/// State file name inside the data directory
pub const STATE_FILE: &str = "modules.json";

/// Persisted module record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub core: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ModulesState {
    #[serde(default)]
    modules: BTreeMap<String, ModuleRecord>,
}

/// A scanned module plus the enabled flag from its manifest
struct ScannedModule {
    descriptor: ModuleDescriptor,
    manifest_enabled: bool,
}

/// The "modules" core module
pub struct ModulesService {
    discovery: ModuleDiscovery,
    state_path: PathBuf,
    enabled_modules: Vec<String>,
    state: Mutex<ModulesState>,
}

impl ModulesService {
    pub fn new<M: AsRef<Path>, D: AsRef<Path>>(
        modules_dir: M,
        data_dir: D,
        enabled_modules: Vec<String>,
    ) -> Self {
        Self {
            discovery: ModuleDiscovery::new(modules_dir),
            state_path: data_dir.as_ref().join(STATE_FILE),
            enabled_modules,
            state: Mutex::new(ModulesState::default()),
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Every persisted record, ordered by name
    pub async fn records(&self) -> Vec<ModuleRecord> {
        self.state.lock().await.modules.values().cloned().collect()
    }

    /// Enable or disable an extension and persist the choice
    ///
    /// The module must be persisted already or currently discoverable.
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), ModuleError> {
        let mut state = self.state.lock().await;
        if let Some(record) = state.modules.get_mut(name) {
            record.enabled = enabled;
        } else {
            let scanned = self.discover(&state).await?;
            let found = scanned
                .into_iter()
                .find(|m| m.descriptor.name == name)
                .ok_or_else(|| ModuleError::ModuleNotFound(name.to_string()))?;
            state.modules.insert(
                name.to_string(),
                ModuleRecord {
                    name: name.to_string(),
                    path: found.descriptor.path,
                    dependencies: found.descriptor.dependencies,
                    enabled,
                    core: false,
                },
            );
        }
        info!("Module {} {}", name, if enabled { "enabled" } else { "disabled" });
        self.save(&state).await
    }

    async fn load(&self) -> Result<ModulesState, ModuleError> {
        if !self.state_path.exists() {
            debug!("No module state at {:?}, starting empty", self.state_path);
            return Ok(ModulesState::default());
        }
        let contents = tokio::fs::read_to_string(&self.state_path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    async fn save(&self, state: &ModulesState) -> Result<(), ModuleError> {
        if let Some(parent) = self.state_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&self.state_path, contents).await?;
        Ok(())
    }

    /// Filesystem discovery merged with persisted extensions still on disk
    ///
    /// The directory walks run on the blocking pool.
    async fn discover(&self, state: &ModulesState) -> Result<Vec<ScannedModule>, ModuleError> {
        let discovery = self.discovery.clone();
        let records: Vec<ModuleRecord> = state
            .modules
            .values()
            .filter(|record| !record.core)
            .cloned()
            .collect();

        tokio::task::spawn_blocking(move || scan(&discovery, records))
            .await
            .map_err(|e| ModuleError::OperationError(format!("module scan task failed: {}", e)))?
    }

    fn is_enabled(&self, state: &ModulesState, module: &ScannedModule) -> bool {
        let name = &module.descriptor.name;
        if !self.enabled_modules.is_empty() {
            return self.enabled_modules.contains(name);
        }
        state
            .modules
            .get(name)
            .map_or(module.manifest_enabled, |record| record.enabled)
    }
}

fn scan(
    discovery: &ModuleDiscovery,
    records: Vec<ModuleRecord>,
) -> Result<Vec<ScannedModule>, ModuleError> {
    let mut scanned: Vec<ScannedModule> = discovery
        .discover_modules()?
        .into_iter()
        .map(|m| ScannedModule {
            manifest_enabled: m.manifest.enabled,
            descriptor: m.to_descriptor(),
        })
        .collect();

    let known: HashSet<String> = scanned.iter().map(|m| m.descriptor.name.clone()).collect();
    for record in records {
        if known.contains(&record.name) {
            continue;
        }
        if let Some(module) = persisted_module(discovery, record) {
            scanned.push(module);
        }
    }
    Ok(scanned)
}

/// Rebuild a persisted extension from its own manifest when it still has one
fn persisted_module(discovery: &ModuleDiscovery, record: ModuleRecord) -> Option<ScannedModule> {
    let directory = Path::new(&record.path);
    if !directory.exists() {
        debug!("Persisted module {} no longer exists at {}", record.name, record.path);
        return None;
    }

    if !directory.join("module.toml").exists() {
        let mut descriptor = ModuleDescriptor::new(&record.name, &record.path);
        descriptor.dependencies = record.dependencies;
        return Some(ScannedModule {
            descriptor,
            manifest_enabled: record.enabled,
        });
    }

    match discovery.discover_at(directory) {
        Ok(module) if module.manifest.name == record.name => Some(ScannedModule {
            manifest_enabled: module.manifest.enabled,
            descriptor: module.to_descriptor(),
        }),
        Ok(module) => {
            warn!(
                "Persisted module {} now declares name {} at {}, skipping",
                record.name, module.manifest.name, record.path
            );
            None
        }
        Err(e) => {
            warn!("Persisted module {} at {} is unreadable: {}", record.name, record.path, e);
            None
        }
    }
}

#[async_trait]
impl Module for ModulesService {
    fn capabilities(&self) -> Capabilities {
        Capabilities::INITIALIZE | Capabilities::HEALTH_CHECK
    }

    async fn initialize(&mut self) -> Result<(), ModuleError> {
        let loaded = self.load().await?;
        info!(
            "Modules service loaded {} persisted record(s) from {:?}",
            loaded.modules.len(),
            self.state_path
        );
        *self.state.get_mut() = loaded;
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, ModuleError> {
        if self.discovery.modules_dir().is_dir() {
            Ok(HealthStatus::healthy())
        } else {
            Ok(HealthStatus::unhealthy(format!(
                "modules directory {:?} is missing",
                self.discovery.modules_dir()
            )))
        }
    }

    fn module_service(&self) -> Option<&dyn ModuleService> {
        Some(self)
    }
}

#[async_trait]
impl ModuleService for ModulesService {
    async fn scan_for_modules(&self) -> Result<Vec<ModuleDescriptor>, ModuleError> {
        let state = self.state.lock().await;
        Ok(self
            .discover(&state)
            .await?
            .into_iter()
            .map(|m| m.descriptor)
            .collect())
    }

    async fn get_enabled_modules(&self) -> Result<Vec<ModuleDescriptor>, ModuleError> {
        let state = self.state.lock().await;
        let scanned = self.discover(&state).await?;
        Ok(scanned
            .into_iter()
            .filter(|m| self.is_enabled(&state, m))
            .map(|m| m.descriptor)
            .collect())
    }

    async fn register_core_module(
        &self,
        name: &str,
        path: &str,
        dependencies: &[String],
    ) -> Result<(), ModuleError> {
        let mut state = self.state.lock().await;
        let record = ModuleRecord {
            name: name.to_string(),
            path: path.to_string(),
            dependencies: dependencies.to_vec(),
            enabled: true,
            core: true,
        };
        if state.modules.get(name) == Some(&record) {
            return Ok(());
        }
        if let Some(existing) = state.modules.get(name) {
            if !existing.core {
                warn!("Core module {} replaces a persisted extension record", name);
            }
        }
        state.modules.insert(name.to_string(), record);
        self.save(&state).await
    }
}
