//! Module validation framework
//!
//! Manifest checks applied during extension discovery.

pub mod manifest_validator;

pub use manifest_validator::{ManifestValidator, ValidationResult};
