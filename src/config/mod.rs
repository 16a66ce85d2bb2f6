//! Runtime configuration
//!
//! Loaded from JSON or TOML (chosen by file extension), then adjusted by
//! environment overrides and command-line flags.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::env::{env_bool, env_opt, env_parse};

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive (e.g. "info", "modos=debug"); RUST_LOG wins when set
    #[serde(default)]
    pub filter: Option<String>,

    /// JSON output (requires the `json-logging` feature)
    #[serde(default)]
    pub json_format: bool,
}

/// Module system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Directory scanned for extension modules
    #[serde(default = "default_modules_dir")]
    pub modules_dir: PathBuf,

    /// Directory for module data and the modules state file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Extensions to enable (empty = defer to persisted state and manifests)
    #[serde(default)]
    pub enabled_modules: Vec<String>,
}

fn default_modules_dir() -> PathBuf {
    PathBuf::from("modules")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            modules_dir: default_modules_dir(),
            data_dir: default_data_dir(),
            enabled_modules: Vec::new(),
        }
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Attach protocol servers when the embedding application provides them
    #[serde(default = "default_true")]
    pub protocol_servers: bool,

    /// Run extension discovery
    #[serde(default = "default_true")]
    pub discovery: bool,

    /// Per-call deadline for lifecycle hooks, in seconds (unset = none)
    #[serde(default)]
    pub lifecycle_timeout_secs: Option<u64>,

    /// Stop registered modules when the bootstrap aborts
    #[serde(default = "default_true")]
    pub rollback_on_failure: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            protocol_servers: true,
            discovery: true,
            lifecycle_timeout_secs: None,
            rollback_on_failure: true,
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub logging: Option<LoggingConfig>,

    #[serde(default)]
    pub modules: ModuleConfig,

    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl RuntimeConfig {
    /// Load configuration from a `.json` or `.toml` file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("invalid TOML in {}", path.display()))?,
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON in {}", path.display()))?,
            other => anyhow::bail!(
                "unsupported config format {:?} for {} (expected .json or .toml)",
                other.unwrap_or(""),
                path.display()
            ),
        };
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `MODOS_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Some(dir) = env_opt("MODOS_DATA_DIR") {
            self.modules.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env_opt("MODOS_MODULES_DIR") {
            self.modules.modules_dir = PathBuf::from(dir);
        }
        if let Some(filter) = env_opt("MODOS_LOG_FILTER") {
            self.logging.get_or_insert_with(LoggingConfig::default).filter = Some(filter);
        }
        if env_bool("MODOS_DISABLE_DISCOVERY") == Some(true) {
            self.bootstrap.discovery = false;
        }
        if let Some(secs) = env_parse::<u64>("MODOS_LIFECYCLE_TIMEOUT_SECS") {
            self.bootstrap.lifecycle_timeout_secs = Some(secs);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.modules.modules_dir.as_os_str().is_empty() {
            anyhow::bail!("modules.modules_dir must not be empty");
        }
        if self.modules.data_dir.as_os_str().is_empty() {
            anyhow::bail!("modules.data_dir must not be empty");
        }
        if self.bootstrap.lifecycle_timeout_secs == Some(0) {
            anyhow::bail!("bootstrap.lifecycle_timeout_secs must be greater than 0 when set");
        }
        if let Some(name) = self.modules.enabled_modules.iter().find(|n| n.trim().is_empty()) {
            anyhow::bail!("modules.enabled_modules contains an empty name ({:?})", name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.modules.modules_dir, PathBuf::from("modules"));
        assert!(config.bootstrap.discovery);
        assert!(config.bootstrap.rollback_on_failure);
        assert!(config.bootstrap.lifecycle_timeout_secs.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_toml_with_partial_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("modos.toml");
        std::fs::write(
            &path,
            "[modules]\nenabled_modules = [\"weather\"]\n\n[bootstrap]\nlifecycle_timeout_secs = 5\n",
        )
        .unwrap();

        let config = RuntimeConfig::from_file(&path).unwrap();
        assert_eq!(config.modules.enabled_modules, vec!["weather".to_string()]);
        assert_eq!(config.modules.data_dir, PathBuf::from("data"));
        assert_eq!(config.bootstrap.lifecycle_timeout_secs, Some(5));
        assert!(config.bootstrap.protocol_servers);
    }

    #[test]
    fn test_json_round_trip_and_unknown_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("modos.json");
        let mut config = RuntimeConfig::default();
        config.logging = Some(LoggingConfig {
            filter: Some("debug".into()),
            json_format: false,
        });
        config.to_json_file(&path).unwrap();
        assert_eq!(RuntimeConfig::from_file(&path).unwrap(), config);

        let yaml = temp.path().join("modos.yaml");
        std::fs::write(&yaml, "modules: {}").unwrap();
        assert!(RuntimeConfig::from_file(&yaml).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = RuntimeConfig::default();
        config.bootstrap.lifecycle_timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }
}
