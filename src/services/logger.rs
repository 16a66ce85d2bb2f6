//! Built-in logging module
//!
//! Installs the tracing subscriber on `initialize()` and then exposes a
//! `TracingLogger`, which the orchestrator switches to in the logger upgrade.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn, Level};

use crate::config::LoggingConfig;
use crate::module::logger::Logger;
use crate::module::traits::{Capabilities, Module, ModuleError};
use crate::utils::logging::init_logging_from_config;

/// Orchestrator logger backed by `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => error!(target: "modos::bootstrap", "{}", message),
            Level::WARN => warn!(target: "modos::bootstrap", "{}", message),
            Level::INFO => info!(target: "modos::bootstrap", "{}", message),
            Level::DEBUG => debug!(target: "modos::bootstrap", "{}", message),
            _ => trace!(target: "modos::bootstrap", "{}", message),
        }
    }
}

/// The "logger" core module
#[derive(Debug, Default)]
pub struct LoggerModule {
    config: Option<LoggingConfig>,
    initialized: bool,
}

impl LoggerModule {
    pub fn new(config: Option<LoggingConfig>) -> Self {
        Self {
            config,
            initialized: false,
        }
    }
}

#[async_trait]
impl Module for LoggerModule {
    fn capabilities(&self) -> Capabilities {
        Capabilities::INITIALIZE
    }

    async fn initialize(&mut self) -> Result<(), ModuleError> {
        if !init_logging_from_config(self.config.as_ref()) {
            debug!("Tracing subscriber already installed, keeping it");
        }
        self.initialized = true;
        Ok(())
    }

    fn logger(&self) -> Option<Arc<dyn Logger>> {
        if !self.initialized {
            return None;
        }
        Some(Arc::new(TracingLogger))
    }
}
