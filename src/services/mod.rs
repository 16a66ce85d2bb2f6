//! Built-in core modules
//!
//! - **logger**: installs tracing, backs the logger upgrade
//! - **modules**: discovery, enablement and registration records
//! - **cli**: command registration for loaded modules

pub mod cli;
pub mod logger;
pub mod modules;

pub use cli::{CliCommand, CliModule};
pub use logger::{LoggerModule, TracingLogger};
pub use modules::{ModuleRecord, ModulesService};

use crate::config::RuntimeConfig;
use crate::module::loader::ModuleFactories;
use crate::module::traits::Module;

/// Factories for the default core table, bound to `config`
pub fn builtin_factories(config: &RuntimeConfig) -> ModuleFactories {
    let mut factories = ModuleFactories::new();

    let logging = config.logging.clone();
    factories.register_constructor("core/logger", move || {
        Box::new(LoggerModule::new(logging.clone())) as Box<dyn Module>
    });

    let modules = config.modules.clone();
    factories.register_constructor("core/modules", move || {
        Box::new(ModulesService::new(
            &modules.modules_dir,
            &modules.data_dir,
            modules.enabled_modules.clone(),
        )) as Box<dyn Module>
    });

    factories.register_default::<CliModule>("core/cli");
    factories
}
