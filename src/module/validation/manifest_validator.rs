//! Manifest validation
//!
//! Checks extension manifests for naming, versioning, and dependency sanity
//! before discovery hands them to the orchestrator.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::module::registry::manifest::ModuleManifest;

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Manifest is valid
    Valid,
    /// Manifest is invalid with specific errors
    Invalid(Vec<String>),
}

/// Manifest validator
#[derive(Debug, Clone)]
pub struct ManifestValidator {
    max_name_len: usize,
}

impl ManifestValidator {
    pub fn new() -> Self {
        Self { max_name_len: 64 }
    }

    /// Validate a module manifest
    pub fn validate(&self, manifest: &ModuleManifest) -> ValidationResult {
        let mut errors = Vec::new();

        if !self.is_valid_name(&manifest.name) {
            errors.push(format!(
                "Invalid module name: {} (must be alphanumeric with dashes/underscores)",
                manifest.name
            ));
        }

        if !self.is_valid_version(&manifest.version) {
            errors.push(format!(
                "Invalid version format: {} (expected semantic versioning)",
                manifest.version
            ));
        }

        let mut seen = HashSet::new();
        for dep in &manifest.dependencies {
            if dep == &manifest.name {
                errors.push(format!("Module {} cannot depend on itself", manifest.name));
            } else if !self.is_valid_name(dep) {
                errors.push(format!("Invalid dependency name: {}", dep));
            } else if !seen.insert(dep.as_str()) {
                errors.push(format!("Duplicate dependency: {}", dep));
            }
        }

        if errors.is_empty() {
            debug!("Manifest validation passed for module: {}", manifest.name);
            ValidationResult::Valid
        } else {
            warn!(
                "Manifest validation failed for module {}: {:?}",
                manifest.name, errors
            );
            ValidationResult::Invalid(errors)
        }
    }

    fn is_valid_name(&self, name: &str) -> bool {
        if name.is_empty() || name.len() > self.max_name_len {
            return false;
        }
        if !name.chars().next().map_or(false, |c| c.is_alphanumeric()) {
            return false;
        }
        name.chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    }

    /// Accepts: major.minor[.patch][-prerelease][+build]
    fn is_valid_version(&self, version: &str) -> bool {
        let base = version.split('+').next().unwrap_or_default();
        let core = base.split('-').next().unwrap_or_default();
        let nums: Vec<&str> = core.split('.').collect();

        if nums.len() < 2 || nums.len() > 3 {
            return false;
        }
        nums.iter()
            .all(|n| !n.is_empty() && n.parse::<u32>().is_ok())
    }
}

impl Default for ManifestValidator {
    fn default() -> Self {
        Self::new()
    }
}
