//! Domain layer: Core types and pure logic.
//!
//! Nothing in here touches the filesystem, the network or the loaded
//! artifacts; everything is deterministic over its inputs.

mod diagnosis;
mod features;
mod patient;

pub use diagnosis::{
    model_display_name, risk_factors, Classification, PredictionResult, RiskLevel,
};
pub use features::{bmi, pulse_pressure, FeatureVector, FEATURE_COLUMNS, NUM_FEATURES};
pub use patient::{PatientInput, GENDER_VALUES, LEVEL_VALUES, YES_NO_VALUES};

#[cfg(test)]
pub(crate) use patient::fixtures;
