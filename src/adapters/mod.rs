//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifacts`: JSON scaler/classifier artifacts and their signed manifest
//! - `sanitize`: secret and PII filtering for logs

pub mod artifacts;
pub mod sanitize;

pub use artifacts::ArtifactError;
