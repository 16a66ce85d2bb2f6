//! Module registry and discovery
//!
//! Holds the registry of loaded modules, the dependency gate, manifest
//! parsing, and filesystem discovery of extension modules.

pub mod dependencies;
pub mod discovery;
pub mod manifest;
pub mod module_registry;

pub use dependencies::DependencyGate;
pub use discovery::{DiscoveredModule, ModuleDiscovery};
pub use manifest::ModuleManifest;
pub use module_registry::{ModuleRegistry, RegisteredModule};
