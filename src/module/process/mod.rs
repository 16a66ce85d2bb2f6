//! Process-backed extension modules
//!
//! Extensions whose manifest names an executable run as child processes
//! behind the ordinary module lifecycle.

pub mod spawner;

pub use spawner::ProcessModule;
