//! Module system for modos
//!
//! Everything the orchestrator needs to know about a module: the lifecycle
//! contract and capability surfaces, the static definition table, how a
//! definition becomes an instance, and where loaded instances live.
//!
//! ## Layout
//!
//! - **traits**: `Module` lifecycle contract, capability surfaces, `ModuleError`
//! - **definition**: `ModuleDefinition`, extension descriptors, the core table
//! - **loader**: compiled-in factories and the `ModuleLoader`
//! - **registry**: insertion-ordered registry, dependency gate, discovery
//! - **process**: executable-backed extension modules
//! - **logger**: the orchestrator's upgradable logger handle

pub mod definition;
pub mod loader;
pub mod logger;
pub mod process;
pub mod registry;
pub mod traits;
pub mod validation;

pub use definition::{
    default_core_definitions, ModuleDefinition, ModuleDescriptor, ModuleType, CLI_MODULE,
    LOGGER_MODULE, MODULES_SERVICE,
};
pub use loader::{ModuleFactories, ModuleLoader};
pub use logger::{ConsoleLogger, Logger, LoggerHandle};
pub use process::ProcessModule;
pub use registry::{DependencyGate, ModuleRegistry};
pub use traits::{
    Capabilities, CommandRegistrar, HealthStatus, Module, ModuleError, ModuleLocation,
    ModuleService, ModuleState,
};
