//! Bootstrap orchestration
//!
//! Phase state machine, per-module outcome report, extension discovery and
//! reverse-order shutdown.

pub mod error;
mod extensions;
pub mod orchestrator;
pub mod phase;
pub mod report;
pub mod shutdown;

pub use error::BootstrapError;
pub use orchestrator::{Bootstrap, BootstrapOptions, ProtocolServers};
pub use phase::{BootstrapPhase, PhaseTracker};
pub use report::{BootstrapReport, LifecycleStage, ModuleOutcome, ModuleReport};
pub use shutdown::{ShutdownCoordinator, ShutdownReport};
