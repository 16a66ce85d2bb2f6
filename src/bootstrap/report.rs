//! Per-module bootstrap outcomes
//!
//! Every notable lifecycle event of a bootstrap run is recorded here instead
//! of only being logged, so callers can inspect what loaded, what was
//! skipped, and what failed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bootstrap::phase::BootstrapPhase;
use crate::module::traits::{Capabilities, ModuleState};

/// Lifecycle step a module was in when its outcome was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStage {
    Load,
    Initialize,
    Start,
    Stop,
}

impl LifecycleStage {
    /// Capability flag guarding this stage's hook; `Load` has none
    pub fn capability(self) -> Option<Capabilities> {
        match self {
            LifecycleStage::Load => None,
            LifecycleStage::Initialize => Some(Capabilities::INITIALIZE),
            LifecycleStage::Start => Some(Capabilities::START),
            LifecycleStage::Stop => Some(Capabilities::STOP),
        }
    }

    /// State a module is in after this stage succeeds
    pub fn success_state(self) -> ModuleState {
        match self {
            LifecycleStage::Load => ModuleState::Loaded,
            LifecycleStage::Initialize => ModuleState::Initialized,
            LifecycleStage::Start => ModuleState::Running,
            LifecycleStage::Stop => ModuleState::Stopped,
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleStage::Load => "load",
            LifecycleStage::Initialize => "initialize",
            LifecycleStage::Start => "start",
            LifecycleStage::Stop => "stop",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleOutcome {
    Loaded,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReport {
    pub name: String,
    pub phase: BootstrapPhase,
    pub stage: LifecycleStage,
    pub outcome: ModuleOutcome,
}

/// Outcomes of one bootstrap run, in the order they happened
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapReport {
    entries: Vec<ModuleReport>,
}

impl BootstrapReport {
    pub fn record(
        &mut self,
        name: &str,
        phase: BootstrapPhase,
        stage: LifecycleStage,
        outcome: ModuleOutcome,
    ) {
        self.entries.push(ModuleReport {
            name: name.to_string(),
            phase,
            stage,
            outcome,
        });
    }

    pub fn entries(&self) -> &[ModuleReport] {
        &self.entries
    }

    /// Latest report recorded for `name`
    pub fn latest(&self, name: &str) -> Option<&ModuleReport> {
        self.entries.iter().rev().find(|e| e.name == name)
    }

    /// Latest outcome recorded for `name`
    pub fn outcome(&self, name: &str) -> Option<&ModuleOutcome> {
        self.latest(name).map(|e| &e.outcome)
    }

    pub fn loaded(&self) -> Vec<&str> {
        self.names_where(|o| matches!(o, ModuleOutcome::Loaded))
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.names_where(|o| matches!(o, ModuleOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> Vec<&str> {
        self.names_where(|o| matches!(o, ModuleOutcome::Failed(_)))
    }

    /// Names whose latest outcome matches, in first-seen order
    fn names_where(&self, pred: impl Fn(&ModuleOutcome) -> bool) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.entries {
            let name = entry.name.as_str();
            if names.contains(&name) {
                continue;
            }
            if self.outcome(name).map_or(false, &pred) {
                names.push(name);
            }
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
