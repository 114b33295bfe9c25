//! # cardiorisk
//!
//! Cardiovascular disease risk prediction over a pre-trained classifier.
//!
//! Raw patient attributes are rebuilt into the exact 13-column feature
//! vector the model was trained on, standardized with the fitted scaler,
//! classified, and returned with a risk tier and advisory risk factors.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Pure types and logic (patient input, feature encoding, risk tiers)
//! - `ports`: Traits for the trained scaler and classifier
//! - `adapters`: JSON artifact loading, manifest signatures, log sanitization
//! - `application`: The prediction service shared by all requests
//! - `http`: axum router exposing the service
//! - `config`: Environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod ports;

pub use domain::{FeatureVector, PatientInput, PredictionResult, RiskLevel, FEATURE_COLUMNS};

/// Result type for cardiorisk operations
pub type Result<T, E = CardioRiskError> = std::result::Result<T, E>;

/// Main error type for prediction requests
#[derive(Debug, thiserror::Error)]
pub enum CardioRiskError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Feature mismatch: {0}")]
    FeatureMismatch(#[source] ports::ScaleError),

    #[error("Invalid patient data: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Prediction failed: {0}")]
    Prediction(String),
}
