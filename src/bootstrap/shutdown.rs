//! Shutdown coordinator
//!
//! Stops registered modules in exact reverse insertion order. Every stop runs
//! inside its own error boundary: failures are logged and the walk continues.

use std::time::Duration;

use crate::bootstrap::orchestrator::Bootstrap;
use crate::module::logger::LoggerHandle;
use crate::module::registry::ModuleRegistry;
use crate::module::traits::{Capabilities, ModuleState};
use crate::utils::timeout::with_lifecycle_timeout;

/// What a shutdown pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Every registered module, in the order it was visited
    pub visited: Vec<String>,
    /// Modules whose `stop()` failed, with the error message
    pub failures: Vec<(String, String)>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ShutdownCoordinator;

impl ShutdownCoordinator {
    /// Stop every module in `registry`, newest first
    ///
    /// Leaves the registry contents in place; the caller clears it.
    pub async fn run(
        registry: &mut ModuleRegistry,
        logger: &LoggerHandle,
        limit: Option<Duration>,
    ) -> ShutdownReport {
        let mut report = ShutdownReport::default();

        for entry in registry.iter_mut().rev() {
            let name = entry.name().to_string();
            report.visited.push(name.clone());

            if !entry.module().capabilities().contains(Capabilities::STOP) {
                continue;
            }

            match with_lifecycle_timeout(&name, limit, entry.module_mut().stop()).await {
                Ok(()) => {
                    entry.set_state(ModuleState::Stopped);
                    logger.debug(format!("Stopped module {}", name));
                }
                Err(e) => {
                    logger.error(format!("Error stopping module {}: {}", name, e));
                    entry.set_state(ModuleState::Error(e.to_string()));
                    report.failures.push((name, e.to_string()));
                }
            }
        }

        report
    }
}

impl Bootstrap {
    /// Stop everything, clear the registry and return to `CORE_MODULES`
    ///
    /// Always completes; stop errors only show up in the returned report.
    pub async fn shutdown(&mut self) -> ShutdownReport {
        self.logger.info(format!(
            "Shutting down {} module(s)",
            self.registry.len()
        ));

        let report = ShutdownCoordinator::run(
            &mut self.registry,
            &self.logger,
            self.options.lifecycle_timeout,
        )
        .await;

        self.registry.clear();
        self.phases.reset();

        if report.is_clean() {
            self.logger.info("Shutdown complete");
        } else {
            self.logger.warn(format!(
                "Shutdown complete with {} stop error(s)",
                report.failures.len()
            ));
        }
        report
    }
}
