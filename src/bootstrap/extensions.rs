//! Extension discovery phase
//!
//! Asks the "modules" service which extensions exist and which are enabled,
//! then loads the enabled ones one at a time. A failing extension never stops
//! the ones after it.

use std::collections::HashSet;

use crate::bootstrap::orchestrator::Bootstrap;
use crate::bootstrap::phase::BootstrapPhase;
use crate::bootstrap::report::{LifecycleStage, ModuleOutcome};
use crate::module::definition::{ModuleDescriptor, MODULES_SERVICE};
use crate::module::registry::DependencyGate;
use crate::module::traits::{Capabilities, Module, ModuleError, ModuleState};
use crate::utils::timeout::with_lifecycle_timeout;

impl Bootstrap {
    /// Load every enabled extension the modules service reports
    pub(crate) async fn discover_extensions(&mut self) {
        let candidates = match self.enabled_extensions().await {
            Some(Ok(candidates)) => candidates,
            Some(Err(e)) => {
                self.logger
                    .warn(format!("Module discovery failed, skipping phase: {}", e));
                return;
            }
            None => {
                self.logger.warn(
                    "Modules service unavailable or lacks discovery; skipping module discovery",
                );
                return;
            }
        };

        self.logger.info(format!(
            "Discovered {} enabled extension module(s)",
            candidates.len()
        ));

        for descriptor in candidates {
            self.load_extension(descriptor).await;
        }
    }

    /// Scanned descriptors that are also enabled, in scan order
    async fn enabled_extensions(&self) -> Option<Result<Vec<ModuleDescriptor>, ModuleError>> {
        let service = self.registry.get(MODULES_SERVICE)?.module_service()?;

        let scanned = match service.scan_for_modules().await {
            Ok(scanned) => scanned,
            Err(e) => return Some(Err(e)),
        };
        let enabled: HashSet<String> = match service.get_enabled_modules().await {
            Ok(enabled) => enabled.into_iter().map(|d| d.name).collect(),
            Err(e) => return Some(Err(e)),
        };

        Some(Ok(scanned
            .into_iter()
            .filter(|d| enabled.contains(&d.name))
            .collect()))
    }

    async fn load_extension(&mut self, descriptor: ModuleDescriptor) {
        let name = descriptor.name.clone();
        let phase = BootstrapPhase::ModuleDiscovery;

        if self.registry.contains(&name) {
            let reason = format!("a module named {} is already registered", name);
            self.logger
                .warn(format!("Skipping extension {}: {}", name, reason));
            self.report
                .record(&name, phase, LifecycleStage::Load, ModuleOutcome::Skipped(reason));
            return;
        }

        let missing = DependencyGate::missing(&descriptor.dependencies, &self.registry);
        if !missing.is_empty() {
            let reason = format!("missing dependencies: {}", missing.join(", "));
            self.logger
                .warn(format!("Skipping extension {}: {}", name, reason));
            self.report
                .record(&name, phase, LifecycleStage::Load, ModuleOutcome::Skipped(reason));
            return;
        }

        let definition = descriptor.to_definition();
        let mut module = match self.loader.construct(&definition) {
            Ok(module) => module,
            Err(e) => return self.extension_failed(&name, LifecycleStage::Load, e),
        };

        let limit = self.options.lifecycle_timeout;
        let capabilities = module.capabilities();
        let mut state = ModuleState::Loaded;

        if capabilities.contains(Capabilities::INITIALIZE) {
            if let Err(e) = with_lifecycle_timeout(&name, limit, module.initialize()).await {
                return self.extension_failed(&name, LifecycleStage::Initialize, e);
            }
            state = ModuleState::Initialized;
        }

        if definition.critical && capabilities.contains(Capabilities::START) {
            if let Err(e) = with_lifecycle_timeout(&name, limit, module.start()).await {
                self.discard(&name, module.as_mut(), limit).await;
                return self.extension_failed(&name, LifecycleStage::Start, e);
            }
            state = ModuleState::Running;
        }

        match self
            .registry
            .insert_with_state(&name, &definition.path, module, state)
        {
            Ok(()) => {
                self.logger.info(format!("Loaded extension module {}", name));
                self.report
                    .record(&name, phase, LifecycleStage::Load, ModuleOutcome::Loaded);
            }
            Err(e) => self.extension_failed(&name, LifecycleStage::Load, e),
        }
    }

    fn extension_failed(&mut self, name: &str, stage: LifecycleStage, error: ModuleError) {
        self.logger.warn(format!(
            "Extension module {} failed to {}: {}",
            name, stage, error
        ));
        self.report.record(
            name,
            BootstrapPhase::ModuleDiscovery,
            stage,
            ModuleOutcome::Failed(error.to_string()),
        );
    }

    /// Best-effort stop of an extension that will not be registered
    async fn discard(
        &self,
        name: &str,
        module: &mut dyn Module,
        limit: Option<std::time::Duration>,
    ) {
        if !module.capabilities().contains(Capabilities::STOP) {
            return;
        }
        if let Err(e) = with_lifecycle_timeout(name, limit, module.stop()).await {
            self.logger
                .warn(format!("Failed to stop discarded extension {}: {}", name, e));
        }
    }
}
