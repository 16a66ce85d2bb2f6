//! Bootstrap orchestrator
//!
//! Drives the phase state machine: core modules (load, initialize, start,
//! persist), optional protocol servers, extension discovery, and the final
//! CLI registration pass. Owns the registry and the logger handle.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::bootstrap::error::BootstrapError;
use crate::bootstrap::phase::{BootstrapPhase, PhaseTracker};
use crate::bootstrap::report::{BootstrapReport, LifecycleStage, ModuleOutcome};
use crate::config::BootstrapConfig;
use crate::module::definition::{ModuleDefinition, CLI_MODULE, LOGGER_MODULE, MODULES_SERVICE};
use crate::module::loader::ModuleLoader;
use crate::module::logger::{Logger, LoggerHandle};
use crate::module::registry::{DependencyGate, ModuleRegistry};
use crate::module::traits::{Capabilities, HealthStatus, ModuleError, ModuleState};
use crate::utils::timeout::with_lifecycle_timeout;

/// External request-handling surface attached after the core phase
#[async_trait]
pub trait ProtocolServers: Send + Sync {
    async fn attach(&mut self, registry: &ModuleRegistry) -> Result<(), ModuleError>;
}

/// Orchestrator behavior switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapOptions {
    /// Run the protocol-server phase when servers are configured
    pub protocol_servers: bool,
    /// Run the extension discovery phase
    pub discovery: bool,
    /// Deadline for each lifecycle call; `None` waits indefinitely
    pub lifecycle_timeout: Option<Duration>,
    /// Stop already-registered modules before returning a fatal error
    pub rollback_on_failure: bool,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            protocol_servers: true,
            discovery: true,
            lifecycle_timeout: None,
            rollback_on_failure: true,
        }
    }
}

impl From<&BootstrapConfig> for BootstrapOptions {
    fn from(config: &BootstrapConfig) -> Self {
        Self {
            protocol_servers: config.protocol_servers,
            discovery: config.discovery,
            lifecycle_timeout: config.lifecycle_timeout_secs.map(Duration::from_secs),
            rollback_on_failure: config.rollback_on_failure,
        }
    }
}

/// Bootstrap orchestrator
pub struct Bootstrap {
    definitions: Vec<ModuleDefinition>,
    pub(crate) loader: ModuleLoader,
    pub(crate) registry: ModuleRegistry,
    pub(crate) phases: PhaseTracker,
    pub(crate) logger: LoggerHandle,
    pub(crate) options: BootstrapOptions,
    protocol_servers: Option<Box<dyn ProtocolServers>>,
    pub(crate) report: BootstrapReport,
}

impl Bootstrap {
    pub fn new(definitions: Vec<ModuleDefinition>, loader: ModuleLoader) -> Self {
        Self {
            definitions,
            loader,
            registry: ModuleRegistry::new(),
            phases: PhaseTracker::new(),
            logger: LoggerHandle::console(),
            options: BootstrapOptions::default(),
            protocol_servers: None,
            report: BootstrapReport::default(),
        }
    }

    pub fn with_options(mut self, options: BootstrapOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the minimal console logger used until the logger upgrade
    pub fn with_bootstrap_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = LoggerHandle::new(logger);
        self
    }

    pub fn with_protocol_servers(mut self, servers: Box<dyn ProtocolServers>) -> Self {
        self.protocol_servers = Some(servers);
        self
    }

    pub fn definitions(&self) -> &[ModuleDefinition] {
        &self.definitions
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn report(&self) -> &BootstrapReport {
        &self.report
    }

    pub fn logger(&self) -> &LoggerHandle {
        &self.logger
    }

    pub fn phase(&self) -> BootstrapPhase {
        self.phases.current()
    }

    pub fn has_completed_phase(&self, phase: BootstrapPhase) -> bool {
        self.phases.has_completed(phase)
    }

    /// Bring the system up
    ///
    /// Returns the report on success. A critical module failure returns
    /// `BootstrapError::CriticalModule`; with `rollback_on_failure` the
    /// modules registered so far are stopped first.
    pub async fn bootstrap(&mut self) -> Result<&BootstrapReport, BootstrapError> {
        if self.phases.current() != BootstrapPhase::CoreModules || !self.registry.is_empty() {
            return Err(BootstrapError::AlreadyBootstrapped);
        }
        self.report = BootstrapReport::default();

        for problem in DependencyGate::audit_table(&self.definitions) {
            self.logger.warn(format!("Module table: {}", problem));
        }

        if let Err(e) = self.run_phases().await {
            self.logger.error(format!("Bootstrap aborted: {}", e));
            if self.options.rollback_on_failure {
                let stopped = self.shutdown().await;
                self.logger.warn(format!(
                    "Rolled back {} module(s) after failed bootstrap",
                    stopped.visited.len()
                ));
            }
            return Err(e);
        }

        Ok(&self.report)
    }

    async fn run_phases(&mut self) -> Result<(), BootstrapError> {
        self.logger.info(format!(
            "Bootstrapping {} core module(s)",
            self.definitions.len()
        ));
        self.run_core_phase().await?;

        if self.options.protocol_servers {
            if let Some(servers) = self.protocol_servers.as_mut() {
                self.phases.advance(BootstrapPhase::McpServers);
                self.logger.info("Attaching protocol servers");
                servers
                    .attach(&self.registry)
                    .await
                    .map_err(BootstrapError::ProtocolServers)?;
            }
        }

        if self.options.discovery {
            self.phases.advance(BootstrapPhase::ModuleDiscovery);
            self.discover_extensions().await;
        }

        self.register_cli_commands().await;

        self.phases.advance(BootstrapPhase::Ready);
        self.logger.info(format!(
            "Bootstrap complete: {} module(s) registered",
            self.registry.len()
        ));
        Ok(())
    }

    async fn run_core_phase(&mut self) -> Result<(), BootstrapError> {
        let definitions = self.definitions.clone();

        for def in &definitions {
            let loaded = self
                .loader
                .load(def, &self.registry)
                .and_then(|module| self.registry.insert(&def.name, &def.path, module));
            match loaded {
                Ok(()) => {
                    self.logger.debug(format!("Loaded module {}", def.name));
                    self.report.record(
                        &def.name,
                        BootstrapPhase::CoreModules,
                        LifecycleStage::Load,
                        ModuleOutcome::Loaded,
                    );
                }
                Err(e) => self.core_failure(def, LifecycleStage::Load, e)?,
            }
        }

        for name in self.registry.names() {
            match self.run_hook(&name, LifecycleStage::Initialize).await {
                Some(Ok(())) => {
                    self.logger.debug(format!("Initialized module {}", name));
                    if name == LOGGER_MODULE {
                        self.upgrade_logger();
                    }
                }
                Some(Err(e)) => {
                    if let Some(def) = definitions.iter().find(|d| d.name == name) {
                        self.core_failure(def, LifecycleStage::Initialize, e)?;
                    }
                }
                None => {}
            }
        }

        for def in definitions.iter().filter(|d| d.critical) {
            match self.run_hook(&def.name, LifecycleStage::Start).await {
                Some(Ok(())) => self.logger.debug(format!("Started module {}", def.name)),
                Some(Err(e)) => self.core_failure(def, LifecycleStage::Start, e)?,
                None => {}
            }
        }

        self.persist_core_modules().await;
        Ok(())
    }

    /// Apply the criticality policy to a core module failure
    fn core_failure(
        &mut self,
        def: &ModuleDefinition,
        stage: LifecycleStage,
        error: ModuleError,
    ) -> Result<(), BootstrapError> {
        let message = error.to_string();
        if def.critical {
            self.logger.error(format!(
                "Critical module {} failed to {}: {}",
                def.name, stage, message
            ));
            self.report.record(
                &def.name,
                BootstrapPhase::CoreModules,
                stage,
                ModuleOutcome::Failed(message),
            );
            return Err(BootstrapError::CriticalModule {
                name: def.name.clone(),
                stage,
                source: error,
            });
        }

        self.logger.warn(format!(
            "Skipping non-critical module {} ({} failed): {}",
            def.name, stage, message
        ));
        let outcome = match error {
            ModuleError::DependencyMissing(_) => ModuleOutcome::Skipped(message),
            _ => ModuleOutcome::Failed(message),
        };
        self.report
            .record(&def.name, BootstrapPhase::CoreModules, stage, outcome);
        Ok(())
    }

    /// Run one lifecycle hook on a registered module
    ///
    /// `None` when the module is absent or does not implement the hook.
    pub(crate) async fn run_hook(
        &mut self,
        name: &str,
        stage: LifecycleStage,
    ) -> Option<Result<(), ModuleError>> {
        let capability = stage.capability()?;
        let limit = self.options.lifecycle_timeout;
        let entry = self.registry.entry_mut(name)?;
        if !entry.module().capabilities().contains(capability) {
            return None;
        }

        let result = {
            let module = entry.module_mut();
            let call = match stage {
                LifecycleStage::Start => module.start(),
                LifecycleStage::Stop => module.stop(),
                _ => module.initialize(),
            };
            with_lifecycle_timeout(name, limit, call).await
        };

        entry.set_state(match &result {
            Ok(()) => stage.success_state(),
            Err(e) => ModuleState::Error(e.to_string()),
        });
        Some(result)
    }

    /// One-time switch from the bootstrap logger to the logger module's
    fn upgrade_logger(&mut self) {
        if self.logger.is_upgraded() {
            return;
        }
        match self.registry.get(LOGGER_MODULE).and_then(|m| m.logger()) {
            Some(logger) => {
                self.logger.upgrade(logger);
                self.logger.info("Logger upgraded to logger module");
            }
            None => self
                .logger
                .warn("Logger module exposes no logger; keeping bootstrap logger"),
        }
    }

    /// Best-effort durable record of the core modules
    async fn persist_core_modules(&mut self) {
        let Some(service) = self
            .registry
            .get(MODULES_SERVICE)
            .and_then(|m| m.module_service())
        else {
            self.logger
                .warn("Modules service cannot register core modules; skipping registration");
            return;
        };

        for def in self.definitions.iter().filter(|d| self.registry.contains(&d.name)) {
            if let Err(e) = service
                .register_core_module(&def.name, &def.path, &def.dependencies)
                .await
            {
                self.logger
                    .warn(format!("Failed to register core module {}: {}", def.name, e));
            }
        }
    }

    /// Final pass: let the CLI module register commands for loaded modules
    async fn register_cli_commands(&mut self) {
        let modules = self.registry.module_map();
        let Some(cli) = self.registry.get_mut(CLI_MODULE) else {
            self.logger.debug("No CLI module loaded; skipping command registration");
            return;
        };
        let Some(registrar) = cli.command_registrar() else {
            self.logger
                .warn("CLI module cannot register commands; skipping command registration");
            return;
        };

        match registrar.scan_and_register_module_commands(&modules).await {
            Ok(()) => self.logger.info(format!(
                "Registered CLI commands for {} module(s)",
                modules.len()
            )),
            Err(e) => self
                .logger
                .warn(format!("CLI command registration failed: {}", e)),
        }
    }

    /// Health of every registered module that implements a health check
    pub async fn health(&self) -> Vec<(String, HealthStatus)> {
        let mut statuses = Vec::new();
        for entry in self.registry.iter() {
            if !entry
                .module()
                .capabilities()
                .contains(Capabilities::HEALTH_CHECK)
            {
                continue;
            }
            let status = match entry.module().health_check().await {
                Ok(status) => status,
                Err(e) => HealthStatus::unhealthy(e.to_string()),
            };
            statuses.push((entry.name().to_string(), status));
        }
        statuses
    }
}
