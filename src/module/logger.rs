//! Orchestrator logger handle
//!
//! The bootstrap starts with a minimal console logger. Once the logger module
//! has initialized, the handle is upgraded to that module's logger exactly
//! once; the upgrade is never reverted.

use std::fmt;
use std::sync::Arc;
use tracing::Level;

/// Sink for orchestrator log lines
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

/// Minimal logger used before any subscriber is installed
///
/// Writes to stderr directly since nothing else is listening yet. Debug lines
/// are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, level: Level, message: &str) {
        if level == Level::DEBUG || level == Level::TRACE {
            return;
        }
        eprintln!("[bootstrap] {:>5} {}", level, message);
    }
}

/// Logger handle owned by the orchestrator
pub struct LoggerHandle {
    current: Arc<dyn Logger>,
    upgraded: bool,
}

impl LoggerHandle {
    /// Handle backed by the console logger
    pub fn console() -> Self {
        Self::new(Arc::new(ConsoleLogger))
    }

    /// Handle backed by a caller-supplied bootstrap logger
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            current: logger,
            upgraded: false,
        }
    }

    /// Replace the bootstrap logger with a full logger
    ///
    /// Returns `false` and leaves the handle untouched if an upgrade already
    /// happened.
    pub fn upgrade(&mut self, logger: Arc<dyn Logger>) -> bool {
        if self.upgraded {
            return false;
        }
        self.current = logger;
        self.upgraded = true;
        true
    }

    pub fn is_upgraded(&self) -> bool {
        self.upgraded
    }

    pub fn current(&self) -> Arc<dyn Logger> {
        Arc::clone(&self.current)
    }

    pub fn log(&self, level: Level, message: impl AsRef<str>) {
        self.current.log(level, message.as_ref());
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(Level::DEBUG, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(Level::INFO, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(Level::WARN, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(Level::ERROR, message);
    }
}

impl Default for LoggerHandle {
    fn default() -> Self {
        Self::console()
    }
}

impl fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerHandle")
            .field("upgraded", &self.upgraded)
            .finish()
    }
}
