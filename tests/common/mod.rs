//! Shared fixtures for orchestrator tests
//!
//! `TestModule` records every lifecycle call into a shared event log so tests
//! can assert ordering across modules. Fakes stand in for the modules service
//! and the CLI module.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::Level;

use modos::module::traits::{CommandRegistrar, ModuleLocation, ModuleService};
use modos::module::{
    Capabilities, Logger, Module, ModuleDefinition, ModuleDescriptor, ModuleError,
    ModuleFactories, ModuleLoader, ModuleType,
};

/// Shared, ordered record of lifecycle calls ("initialize:logger", ...)
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Module names for one kind of event, in call order
    pub fn of(&self, kind: &str) -> Vec<String> {
        let prefix = format!("{}:", kind);
        self.all()
            .into_iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }
}

/// Logger capturing every line with its level
#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingLogger {
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    pub fn any(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, m)| m.contains(needle))
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: Level, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}

/// How a `TestModule` behaves
#[derive(Clone)]
pub struct Behavior {
    pub capabilities: Capabilities,
    pub fail_initialize: bool,
    pub fail_start: bool,
    pub fail_stop: bool,
    pub initialize_delay: Option<Duration>,
    pub exposes_logger: Option<Arc<RecordingLogger>>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::LIFECYCLE,
            fail_initialize: false,
            fail_start: false,
            fail_stop: false,
            initialize_delay: None,
            exposes_logger: None,
        }
    }
}

impl Behavior {
    pub fn failing_initialize() -> Self {
        Self {
            fail_initialize: true,
            ..Self::default()
        }
    }

    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub fn failing_stop() -> Self {
        Self {
            fail_stop: true,
            ..Self::default()
        }
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    pub fn logging_to(logger: Arc<RecordingLogger>) -> Self {
        Self {
            exposes_logger: Some(logger),
            ..Self::default()
        }
    }
}

pub struct TestModule {
    name: String,
    events: EventLog,
    behavior: Behavior,
    initialized: bool,
}

impl TestModule {
    pub fn new(name: &str, events: EventLog, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            events,
            behavior,
            initialized: false,
        }
    }
}

#[async_trait]
impl Module for TestModule {
    fn capabilities(&self) -> Capabilities {
        self.behavior.capabilities
    }

    async fn initialize(&mut self) -> Result<(), ModuleError> {
        self.events.push(format!("initialize:{}", self.name));
        if let Some(delay) = self.behavior.initialize_delay {
            tokio::time::sleep(delay).await;
        }
        if self.behavior.fail_initialize {
            return Err(ModuleError::InitializationError(format!(
                "{} refused to initialize",
                self.name
            )));
        }
        self.initialized = true;
        Ok(())
    }

    async fn start(&mut self) -> Result<(), ModuleError> {
        self.events.push(format!("start:{}", self.name));
        if self.behavior.fail_start {
            return Err(ModuleError::OperationError(format!("{} refused to start", self.name)));
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ModuleError> {
        self.events.push(format!("stop:{}", self.name));
        if self.behavior.fail_stop {
            return Err(ModuleError::OperationError(format!("{} refused to stop", self.name)));
        }
        Ok(())
    }

    fn logger(&self) -> Option<Arc<dyn Logger>> {
        if !self.initialized {
            return None;
        }
        self.behavior
            .exposes_logger
            .clone()
            .map(|l| l as Arc<dyn Logger>)
    }
}

/// Fake "modules" service with a fixed scan result
pub struct FakeModulesService {
    pub scanned: Vec<ModuleDescriptor>,
    pub enabled: Vec<String>,
    pub registered: Arc<Mutex<Vec<String>>>,
    pub fail_scan: bool,
}

impl FakeModulesService {
    pub fn new(scanned: Vec<ModuleDescriptor>, enabled: &[&str]) -> Self {
        Self {
            scanned,
            enabled: enabled.iter().map(|s| s.to_string()).collect(),
            registered: Arc::new(Mutex::new(Vec::new())),
            fail_scan: false,
        }
    }
}

#[async_trait]
impl Module for FakeModulesService {
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    fn module_service(&self) -> Option<&dyn ModuleService> {
        Some(self)
    }
}

#[async_trait]
impl ModuleService for FakeModulesService {
    async fn scan_for_modules(&self) -> Result<Vec<ModuleDescriptor>, ModuleError> {
        if self.fail_scan {
            return Err(ModuleError::OperationError("modules directory unreadable".into()));
        }
        Ok(self.scanned.clone())
    }

    async fn get_enabled_modules(&self) -> Result<Vec<ModuleDescriptor>, ModuleError> {
        if self.fail_scan {
            return Err(ModuleError::OperationError("modules directory unreadable".into()));
        }
        Ok(self
            .scanned
            .iter()
            .filter(|d| self.enabled.contains(&d.name))
            .cloned()
            .collect())
    }

    async fn register_core_module(
        &self,
        name: &str,
        _path: &str,
        _dependencies: &[String],
    ) -> Result<(), ModuleError> {
        self.registered.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

/// Fake CLI module recording the module map it was handed
pub struct FakeCli {
    pub seen: Arc<Mutex<Option<Vec<String>>>>,
    pub fail: bool,
}

#[async_trait]
impl Module for FakeCli {
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    fn command_registrar(&mut self) -> Option<&mut dyn CommandRegistrar> {
        Some(self)
    }
}

#[async_trait]
impl CommandRegistrar for FakeCli {
    async fn scan_and_register_module_commands(
        &mut self,
        modules: &BTreeMap<String, ModuleLocation>,
    ) -> Result<(), ModuleError> {
        *self.seen.lock().unwrap() = Some(modules.keys().cloned().collect());
        if self.fail {
            return Err(ModuleError::OperationError("command scan failed".into()));
        }
        Ok(())
    }
}

/// Load path used for test modules
pub fn test_path(name: &str) -> String {
    format!("test/{}", name)
}

/// Non-critical definition resolved through `test_path`
pub fn def(name: &str) -> ModuleDefinition {
    ModuleDefinition::new(name, test_path(name), ModuleType::Service)
}

/// Critical definition resolved through `test_path`
pub fn critical(name: &str) -> ModuleDefinition {
    def(name).critical(true)
}

/// Extension descriptor resolved through `test_path`
pub fn extension(name: &str) -> ModuleDescriptor {
    ModuleDescriptor::new(name, test_path(name))
}

/// Factories plus the event log every test module writes to
#[derive(Default)]
pub struct Harness {
    pub events: EventLog,
    pub factories: ModuleFactories,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a `TestModule` named `name` under `test_path(name)`
    pub fn module(&mut self, name: &str, behavior: Behavior) -> &mut Self {
        let events = self.events.clone();
        let owned = name.to_string();
        self.factories
            .register_constructor(test_path(name), move || {
                Box::new(TestModule::new(&owned, events.clone(), behavior.clone())) as Box<dyn Module>
            });
        self
    }

    pub fn modules(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            self.module(name, Behavior::default());
        }
        self
    }

    /// Register a fake modules service under `test_path("modules")`
    pub fn modules_service(
        &mut self,
        scanned: Vec<ModuleDescriptor>,
        enabled: &[&str],
    ) -> Arc<Mutex<Vec<String>>> {
        self.register_modules_service(scanned, enabled, false)
    }

    /// Register a fake modules service whose scans always fail
    pub fn failing_modules_service(&mut self, scanned: Vec<ModuleDescriptor>, enabled: &[&str]) {
        self.register_modules_service(scanned, enabled, true);
    }

    fn register_modules_service(
        &mut self,
        scanned: Vec<ModuleDescriptor>,
        enabled: &[&str],
        fail_scan: bool,
    ) -> Arc<Mutex<Vec<String>>> {
        let registered = Arc::new(Mutex::new(Vec::new()));
        let shared = registered.clone();
        let enabled: Vec<String> = enabled.iter().map(|s| s.to_string()).collect();
        self.factories.register_constructor(test_path("modules"), move || {
            Box::new(FakeModulesService {
                scanned: scanned.clone(),
                enabled: enabled.clone(),
                registered: shared.clone(),
                fail_scan,
            }) as Box<dyn Module>
        });
        registered
    }

    /// Register a fake CLI under `test_path("cli")`
    pub fn cli(&mut self, fail: bool) -> Arc<Mutex<Option<Vec<String>>>> {
        let seen = Arc::new(Mutex::new(None));
        let shared = seen.clone();
        self.factories.register_constructor(test_path("cli"), move || {
            Box::new(FakeCli {
                seen: shared.clone(),
                fail,
            }) as Box<dyn Module>
        });
        seen
    }

    pub fn loader(&self) -> ModuleLoader {
        ModuleLoader::new(self.factories.clone(), "target/test-data")
    }
}
