//! Built-in CLI module
//!
//! Collects the commands each loaded module ships in its `cli/` directory.
//! Argument parsing of individual commands is left to the commands.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::module::traits::{
    Capabilities, CommandRegistrar, Module, ModuleError, ModuleLocation,
};

/// Directory inside a module that holds its commands
pub const COMMANDS_DIR: &str = "cli";

/// A command contributed by a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliCommand {
    pub module_name: String,
    pub command_name: String,
    pub command_path: PathBuf,
}

/// The "cli" core module
#[derive(Debug, Default)]
pub struct CliModule {
    commands: BTreeMap<(String, String), CliCommand>,
}

impl CliModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered commands, ordered by module then command name
    pub fn commands(&self) -> impl Iterator<Item = &CliCommand> {
        self.commands.values()
    }

    pub fn command(&self, module_name: &str, command_name: &str) -> Option<&CliCommand> {
        self.commands
            .get(&(module_name.to_string(), command_name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn scan_module(module_name: &str, module_path: &Path) -> Result<Vec<CliCommand>, ModuleError> {
        let commands_dir = module_path.join(COMMANDS_DIR);
        if !module_path.is_dir() || !commands_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut commands = Vec::new();
        for entry in std::fs::read_dir(&commands_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            commands.push(CliCommand {
                module_name: module_name.to_string(),
                command_name: stem.to_string(),
                command_path: path.clone(),
            });
        }
        Ok(commands)
    }
}

#[async_trait]
impl Module for CliModule {
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    fn command_registrar(&mut self) -> Option<&mut dyn CommandRegistrar> {
        Some(self)
    }
}

#[async_trait]
impl CommandRegistrar for CliModule {
    async fn scan_and_register_module_commands(
        &mut self,
        modules: &BTreeMap<String, ModuleLocation>,
    ) -> Result<(), ModuleError> {
        self.commands.clear();

        for (name, location) in modules {
            match Self::scan_module(name, &location.path) {
                Ok(commands) => {
                    for command in commands {
                        debug!(
                            "Registered command {} for module {}",
                            command.command_name, name
                        );
                        self.commands.insert(
                            (command.module_name.clone(), command.command_name.clone()),
                            command,
                        );
                    }
                }
                Err(e) => warn!("Failed to scan commands for module {}: {}", name, e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_registers_commands_from_module_dirs() {
        let temp = TempDir::new().unwrap();
        let weather = temp.path().join("weather");
        std::fs::create_dir_all(weather.join("cli").join("nested")).unwrap();
        std::fs::write(weather.join("cli").join("forecast.sh"), "").unwrap();
        std::fs::write(weather.join("cli").join("alerts"), "").unwrap();
        let bare = temp.path().join("bare");
        std::fs::create_dir_all(&bare).unwrap();

        let mut modules = BTreeMap::new();
        modules.insert("weather".to_string(), ModuleLocation { path: weather.clone() });
        modules.insert("bare".to_string(), ModuleLocation { path: bare });
        modules.insert(
            "logger".to_string(),
            ModuleLocation { path: PathBuf::from("core/logger") },
        );

        let mut cli = CliModule::new();
        cli.scan_and_register_module_commands(&modules).await.unwrap();

        let names: Vec<&str> = cli.commands().map(|c| c.command_name.as_str()).collect();
        assert_eq!(names, vec!["alerts", "forecast"]);
        let forecast = cli.command("weather", "forecast").unwrap();
        assert_eq!(forecast.command_path, weather.join("cli").join("forecast.sh"));
        assert!(cli.command("bare", "anything").is_none());

        // Rescanning replaces the previous set
        cli.scan_and_register_module_commands(&BTreeMap::new())
            .await
            .unwrap();
        assert!(cli.is_empty());
    }
}
