//! Application layer: Use cases and services.
//!
//! This module wires the domain pipeline to the loaded artifacts.

mod prediction;

pub use prediction::{ArtifactPredictionService, PredictionService, ServiceStatus};
