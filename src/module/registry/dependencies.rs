//! Dependency gate
//!
//! Presence check run immediately before a module is loaded. The definition
//! table order is trusted; nothing here reorders modules.

use std::collections::HashSet;
use tracing::debug;

use crate::module::definition::ModuleDefinition;
use crate::module::registry::module_registry::ModuleRegistry;
use crate::module::traits::ModuleError;

/// Dependency presence predicate
pub struct DependencyGate;

impl DependencyGate {
    /// True iff every dependency is currently registered
    pub fn satisfied(dependencies: &[String], registry: &ModuleRegistry) -> bool {
        dependencies.iter().all(|dep| registry.contains(dep))
    }

    /// Dependencies not yet registered, in declaration order
    pub fn missing<'a>(dependencies: &'a [String], registry: &ModuleRegistry) -> Vec<&'a str> {
        dependencies
            .iter()
            .filter(|dep| !registry.contains(dep))
            .map(String::as_str)
            .collect()
    }

    /// Gate check as a `Result`, for the loader
    pub fn check(definition: &ModuleDefinition, registry: &ModuleRegistry) -> Result<(), ModuleError> {
        let missing = Self::missing(&definition.dependencies, registry);
        if missing.is_empty() {
            debug!("Dependencies satisfied for module {}", definition.name);
            return Ok(());
        }
        Err(ModuleError::DependencyMissing(format!(
            "{} requires {}",
            definition.name,
            missing.join(", ")
        )))
    }

    /// Problems with a definition table's ordering
    ///
    /// Reports duplicate names and dependencies that do not appear earlier in
    /// the table. Purely diagnostic; the gate still decides at load time.
    pub fn audit_table(definitions: &[ModuleDefinition]) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut problems = Vec::new();

        for def in definitions {
            for dep in &def.dependencies {
                if dep == &def.name {
                    problems.push(format!("{} depends on itself", def.name));
                } else if !seen.contains(dep.as_str()) {
                    problems.push(format!(
                        "{} depends on {} which is not defined before it",
                        def.name, dep
                    ));
                }
            }
            if !seen.insert(def.name.as_str()) {
                problems.push(format!("{} is defined more than once", def.name));
            }
        }

        problems
    }
}
