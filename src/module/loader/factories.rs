//! Compiled-in module constructors
//!
//! Maps a definition's load path to the two supported construction
//! conventions: a fallible zero-argument factory, tried first, and a
//! zero-argument default constructor.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::module::traits::{Module, ModuleError};

/// Zero-argument factory function
pub type FactoryFn = Arc<dyn Fn() -> Result<Box<dyn Module>, ModuleError> + Send + Sync>;
/// Zero-argument default constructor
pub type ConstructorFn = Arc<dyn Fn() -> Box<dyn Module> + Send + Sync>;

#[derive(Clone, Default)]
struct FactoryEntry {
    factory: Option<FactoryFn>,
    constructor: Option<ConstructorFn>,
}

/// Registry of module constructors keyed by load path
#[derive(Clone, Default)]
pub struct ModuleFactories {
    entries: HashMap<String, FactoryEntry>,
}

impl ModuleFactories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory function for `path`
    pub fn register_factory<F>(&mut self, path: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn Module>, ModuleError> + Send + Sync + 'static,
    {
        self.entries.entry(path.into()).or_default().factory = Some(Arc::new(factory));
        self
    }

    /// Register a default constructor for `path`
    pub fn register_constructor<F>(&mut self, path: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Module> + Send + Sync + 'static,
    {
        self.entries.entry(path.into()).or_default().constructor = Some(Arc::new(constructor));
        self
    }

    /// Register `M::default()` as the default constructor for `path`
    pub fn register_default<M>(&mut self, path: impl Into<String>) -> &mut Self
    where
        M: Module + Default + 'static,
    {
        self.register_constructor(path, || Box::new(M::default()) as Box<dyn Module>)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Construct the module registered for `path`
    ///
    /// `None` when neither convention is registered.
    pub fn construct(&self, path: &str) -> Option<Result<Box<dyn Module>, ModuleError>> {
        let entry = self.entries.get(path)?;
        if let Some(factory) = &entry.factory {
            return Some(factory());
        }
        entry.constructor.as_ref().map(|constructor| Ok(constructor()))
    }
}

impl fmt::Debug for ModuleFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<&String> = self.entries.keys().collect();
        paths.sort();
        f.debug_struct("ModuleFactories").field("paths", &paths).finish()
    }
}
