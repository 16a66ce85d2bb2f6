//! modos - modular runtime
//!
//! Brings up a graph of interdependent service modules in a deterministic
//! order, tolerates failure of non-essential modules, discovers and loads
//! extension modules at runtime, and tears everything down in reverse.
//!
//! ## Bootstrap phases
//!
//! 1. `CORE_MODULES`: load, initialize and start the static definition table
//! 2. `MCP_SERVERS`: attach external protocol servers (optional)
//! 3. `MODULE_DISCOVERY`: load enabled extensions (optional)
//! 4. `READY`
//!
//! ## Failure policy
//!
//! A critical module failing at load, initialize or start aborts the
//! bootstrap. Every other failure is logged, recorded in the
//! [`BootstrapReport`], and skipped. Shutdown is best-effort.

pub mod bootstrap;
pub mod config;
pub mod module;
pub mod services;
pub mod utils;

pub use bootstrap::{
    Bootstrap, BootstrapError, BootstrapOptions, BootstrapPhase, BootstrapReport, ModuleOutcome,
    ProtocolServers, ShutdownReport,
};
pub use config::RuntimeConfig;
pub use module::{
    default_core_definitions, Capabilities, Module, ModuleDefinition, ModuleError, ModuleLoader,
    ModuleRegistry, ModuleType,
};
pub use services::builtin_factories;
