//! Module registry
//!
//! Insertion-ordered, exclusively owned map of loaded module instances. The
//! insertion order drives reverse-order shutdown and the CLI final pass.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use crate::module::traits::{Module, ModuleError, ModuleLocation, ModuleState};

/// A module instance together with the name and path it was loaded under
pub struct RegisteredModule {
    name: String,
    path: String,
    state: ModuleState,
    module: Box<dyn Module>,
}

impl RegisteredModule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn state(&self) -> &ModuleState {
        &self.state
    }

    pub(crate) fn set_state(&mut self, state: ModuleState) {
        self.state = state;
    }

    pub fn module(&self) -> &dyn Module {
        self.module.as_ref()
    }

    pub fn module_mut(&mut self) -> &mut (dyn Module + 'static) {
        self.module.as_mut()
    }
}

impl fmt::Debug for RegisteredModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredModule")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("state", &self.state)
            .finish()
    }
}

/// Registry of loaded modules
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    entries: Vec<RegisteredModule>,
    index: HashMap<String, usize>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly loaded module; each name may be registered once
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        path: impl Into<String>,
        module: Box<dyn Module>,
    ) -> Result<(), ModuleError> {
        self.insert_with_state(name, path, module, ModuleState::Loaded)
    }

    pub(crate) fn insert_with_state(
        &mut self,
        name: impl Into<String>,
        path: impl Into<String>,
        module: Box<dyn Module>,
        state: ModuleState,
    ) -> Result<(), ModuleError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(ModuleError::AlreadyRegistered(name));
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(RegisteredModule {
            name,
            path: path.into(),
            state,
            module,
        });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Module> {
        self.index.get(name).map(|&i| self.entries[i].module())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Module + 'static)> {
        let i = *self.index.get(name)?;
        Some(self.entries[i].module_mut())
    }

    pub(crate) fn entry_mut(&mut self, name: &str) -> Option<&mut RegisteredModule> {
        let i = *self.index.get(name)?;
        Some(&mut self.entries[i])
    }

    pub fn state_of(&self, name: &str) -> Option<&ModuleState> {
        self.index.get(name).map(|&i| self.entries[i].state())
    }

    pub fn path_of(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&i| self.entries[i].path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &RegisteredModule> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut RegisteredModule> {
        self.entries.iter_mut()
    }

    /// name → path map of every registered module
    pub fn module_map(&self) -> BTreeMap<String, ModuleLocation> {
        self.entries
            .iter()
            .map(|e| {
                (
                    e.name.clone(),
                    ModuleLocation {
                        path: PathBuf::from(&e.path),
                    },
                )
            })
            .collect()
    }

    /// Drop every module
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}
