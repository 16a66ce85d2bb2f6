//! Module discovery
//!
//! Scans the modules directory for `module.toml` manifests.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::module::definition::ModuleDescriptor;
use crate::module::registry::manifest::ModuleManifest;
use crate::module::traits::ModuleError;
use crate::module::validation::{ManifestValidator, ValidationResult};

/// Discovered module information
#[derive(Debug, Clone)]
pub struct DiscoveredModule {
    /// Module directory path
    pub directory: PathBuf,
    /// Module manifest
    pub manifest: ModuleManifest,
    /// Resolved executable, when the manifest names one that exists
    pub binary_path: Option<PathBuf>,
}

impl DiscoveredModule {
    pub fn to_descriptor(&self) -> ModuleDescriptor {
        self.manifest
            .to_descriptor(&self.directory, self.binary_path.clone())
    }
}

/// Module discovery scanner
#[derive(Debug, Clone)]
pub struct ModuleDiscovery {
    /// Base directory to scan for modules
    modules_dir: PathBuf,
    validator: ManifestValidator,
}

impl ModuleDiscovery {
    pub fn new<P: AsRef<Path>>(modules_dir: P) -> Self {
        Self {
            modules_dir: modules_dir.as_ref().to_path_buf(),
            validator: ManifestValidator::new(),
        }
    }

    pub fn modules_dir(&self) -> &Path {
        &self.modules_dir
    }

    /// Discover all modules in the modules directory, sorted by name
    pub fn discover_modules(&self) -> Result<Vec<DiscoveredModule>, ModuleError> {
        info!("Discovering modules in {:?}", self.modules_dir);

        if !self.modules_dir.exists() {
            debug!("Modules directory does not exist, creating: {:?}", self.modules_dir);
            fs::create_dir_all(&self.modules_dir)?;
            return Ok(Vec::new());
        }

        let mut modules = Vec::new();
        for entry in fs::read_dir(&self.modules_dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }

            let manifest_path = path.join("module.toml");
            if !manifest_path.exists() {
                debug!("No module.toml found in {:?}, skipping", path);
                continue;
            }

            match self.read_module(&path, &manifest_path) {
                Ok(Some(module)) => modules.push(module),
                Ok(None) => {}
                Err(e) => warn!("Failed to read module in {:?}: {}", path, e),
            }
        }

        modules.sort_by(|a, b| a.manifest.name.cmp(&b.manifest.name));
        info!("Discovered {} modules", modules.len());
        Ok(modules)
    }

    /// Read and validate the module in `module_dir`, wherever it lives
    pub fn discover_at(&self, module_dir: &Path) -> Result<DiscoveredModule, ModuleError> {
        let manifest_path = module_dir.join("module.toml");

        if !manifest_path.exists() {
            return Err(ModuleError::ModuleNotFound(format!(
                "no module.toml in {:?}",
                module_dir
            )));
        }

        self.read_module(module_dir, &manifest_path)?.ok_or_else(|| {
            ModuleError::InvalidManifest(format!("manifest in {:?} failed validation", module_dir))
        })
    }

    fn read_module(
        &self,
        directory: &Path,
        manifest_path: &Path,
    ) -> Result<Option<DiscoveredModule>, ModuleError> {
        let manifest = ModuleManifest::from_file(manifest_path)?;

        if let ValidationResult::Invalid(errors) = self.validator.validate(&manifest) {
            warn!(
                "Skipping module {} with invalid manifest: {}",
                manifest.name,
                errors.join("; ")
            );
            return Ok(None);
        }

        let binary_path = match manifest.entry_point.as_deref() {
            Some(entry) => {
                let found = Self::find_module_binary(directory, entry);
                if found.is_none() {
                    warn!(
                        "Entry point {} for module {} not found in {:?}",
                        entry, manifest.name, directory
                    );
                }
                found
            }
            None => None,
        };

        Ok(Some(DiscoveredModule {
            directory: directory.to_path_buf(),
            manifest,
            binary_path,
        }))
    }

    fn find_module_binary(module_dir: &Path, entry_point: &str) -> Option<PathBuf> {
        let candidates = [
            module_dir.join(entry_point),
            module_dir.join("target").join("release").join(entry_point),
            module_dir.join("target").join("debug").join(entry_point),
        ];

        candidates.into_iter().find(|candidate| Self::is_executable(candidate))
    }

    #[cfg(unix)]
    fn is_executable(path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    fn is_executable(path: &Path) -> bool {
        path.is_file()
    }
}
