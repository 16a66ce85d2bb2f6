//! Bootstrap phase state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bootstrap phases, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BootstrapPhase {
    /// Loading, initializing and starting the definition table
    CoreModules,
    /// Attaching external protocol servers
    McpServers,
    /// Loading enabled extension modules
    ModuleDiscovery,
    /// Everything is up
    Ready,
}

impl BootstrapPhase {
    pub const ALL: [BootstrapPhase; 4] = [
        BootstrapPhase::CoreModules,
        BootstrapPhase::McpServers,
        BootstrapPhase::ModuleDiscovery,
        BootstrapPhase::Ready,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for BootstrapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootstrapPhase::CoreModules => "CORE_MODULES",
            BootstrapPhase::McpServers => "MCP_SERVERS",
            BootstrapPhase::ModuleDiscovery => "MODULE_DISCOVERY",
            BootstrapPhase::Ready => "READY",
        };
        f.write_str(name)
    }
}

/// Monotonic phase tracker
///
/// Only moves forward. `reset()` is reserved for a completed shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTracker {
    current: BootstrapPhase,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            current: BootstrapPhase::CoreModules,
        }
    }

    pub fn current(&self) -> BootstrapPhase {
        self.current
    }

    /// Move to `next` if it is strictly later than the current phase
    pub fn advance(&mut self, next: BootstrapPhase) -> bool {
        if next > self.current {
            self.current = next;
            true
        } else {
            false
        }
    }

    /// True for every phase at or before the current one
    pub fn has_completed(&self, phase: BootstrapPhase) -> bool {
        phase.ordinal() <= self.current.ordinal()
    }

    pub fn reset(&mut self) {
        self.current = BootstrapPhase::CoreModules;
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
