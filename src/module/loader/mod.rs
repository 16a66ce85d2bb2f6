//! Module loading system
//!
//! Factory resolution and module construction.

pub mod factories;
pub mod loader;

pub use factories::{ConstructorFn, FactoryFn, ModuleFactories};
pub use loader::ModuleLoader;
