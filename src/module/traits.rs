//! Module system traits and interfaces
//!
//! Defines the lifecycle contract every module implements and the optional
//! capability surfaces the orchestrator consumes (logger, modules service,
//! CLI command registration).

use async_trait::async_trait;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::module::definition::ModuleDescriptor;
use crate::module::logger::Logger;

bitflags! {
    /// Lifecycle hooks a module actually implements.
    ///
    /// The orchestrator only calls a hook whose flag is set, so a module that
    /// has nothing to do on `start()` can leave it out and the bootstrap log
    /// stays accurate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const INITIALIZE = 0b0001;
        const START = 0b0010;
        const STOP = 0b0100;
        const HEALTH_CHECK = 0b1000;
        const LIFECYCLE = Self::INITIALIZE.bits()
            | Self::START.bits()
            | Self::STOP.bits()
            | Self::HEALTH_CHECK.bits();
    }
}

/// Module lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleState {
    /// Constructed but not yet initialized
    Loaded,
    /// `initialize()` completed
    Initialized,
    /// `start()` completed
    Running,
    /// `stop()` completed
    Stopped,
    /// A lifecycle call failed
    Error(String),
}

/// Result of a module health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            detail: None,
        }
    }

    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            healthy: false,
            detail: Some(detail.into()),
        }
    }
}

/// Module trait that all modules implement
///
/// Every hook has a no-op default. `capabilities()` advertises which hooks
/// carry real behavior; the orchestrator skips the others.
#[async_trait]
pub trait Module: Send + Sync {
    /// Lifecycle hooks this module implements
    fn capabilities(&self) -> Capabilities {
        Capabilities::LIFECYCLE
    }

    /// Prepare the module. Called once after every core module is loaded.
    async fn initialize(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Begin processing. Only critical modules are started during bootstrap.
    async fn start(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Release resources. Called in reverse load order at shutdown.
    async fn stop(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, ModuleError> {
        Ok(HealthStatus::healthy())
    }

    /// Full logger exposed by a logging module once it is initialized
    fn logger(&self) -> Option<Arc<dyn Logger>> {
        None
    }

    /// Discovery/registration surface of the "modules" service
    fn module_service(&self) -> Option<&dyn ModuleService> {
        None
    }

    /// Command registration surface of the CLI module
    fn command_registrar(&mut self) -> Option<&mut dyn CommandRegistrar> {
        None
    }
}

/// Capability surface of the "modules" service
///
/// Consumed by extension discovery and by the core-module persistence step.
#[async_trait]
pub trait ModuleService: Send + Sync {
    /// Every module descriptor that can be discovered
    async fn scan_for_modules(&self) -> Result<Vec<ModuleDescriptor>, ModuleError>;

    /// Descriptors currently marked enabled
    async fn get_enabled_modules(&self) -> Result<Vec<ModuleDescriptor>, ModuleError>;

    /// Durably record a core module. Best-effort from the orchestrator's view.
    async fn register_core_module(
        &self,
        name: &str,
        path: &str,
        dependencies: &[String],
    ) -> Result<(), ModuleError>;
}

/// Entry in the name→path map handed to the CLI module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLocation {
    pub path: PathBuf,
}

/// Capability surface of the CLI module
#[async_trait]
pub trait CommandRegistrar: Send + Sync {
    async fn scan_and_register_module_commands(
        &mut self,
        modules: &BTreeMap<String, ModuleLocation>,
    ) -> Result<(), ModuleError>;
}

/// Module system errors
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Module load failed: {0}")]
    LoadError(String),

    #[error("Module dependency missing: {0}")]
    DependencyMissing(String),

    #[error("Module already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Module initialization failed: {0}")]
    InitializationError(String),

    #[error("Module operation failed: {0}")]
    OperationError(String),

    #[error("Invalid module manifest: {0}")]
    InvalidManifest(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeout waiting for module {0}")]
    Timeout(String),
}

impl From<serde_json::Error> for ModuleError {
    fn from(e: serde_json::Error) -> Self {
        ModuleError::SerializationError(e.to_string())
    }
}

impl From<anyhow::Error> for ModuleError {
    fn from(e: anyhow::Error) -> Self {
        ModuleError::OperationError(e.to_string())
    }
}
