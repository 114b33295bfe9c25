//! Prediction service: runs the full pipeline for one patient.
//!
//! Pipeline per request:
//! 1. Fail fast if the artifacts never loaded
//! 2. Validate the raw input
//! 3. Encode the fixed-order feature vector
//! 4. Scale (with one reindex retry on column mismatch)
//! 5. Classify
//! 6. Derive risk tier, risk factors and display label

use std::path::Path;

use serde::Serialize;

use crate::adapters::artifacts::{self, ClassifierModel, StandardScaler, VerifyOptions};
use crate::domain::{
    model_display_name, risk_factors, FeatureVector, PatientInput, PredictionResult, RiskLevel,
    FEATURE_COLUMNS,
};
use crate::ports::{Classifier, ScaleError, Scaler};
use crate::{CardioRiskError, Result};

enum ModelState<S, C> {
    Ready {
        scaler: S,
        classifier: C,
        loaded_at: chrono::DateTime<chrono::Utc>,
    },
    Unavailable {
        reason: String,
    },
}

/// Service for running risk predictions.
///
/// Built once at startup and never mutated afterwards, so a single instance
/// behind an `Arc` serves any number of concurrent requests without locking.
pub struct PredictionService<S, C>
where
    S: Scaler,
    C: Classifier,
{
    state: ModelState<S, C>,
    strict_columns: bool,
}

/// Service backed by the JSON artifacts on disk.
pub type ArtifactPredictionService = PredictionService<StandardScaler, ClassifierModel>;

/// Snapshot of service health for the `/health` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub status: &'static str,
    pub model_loaded: bool,
    pub classifier: Option<&'static str>,
    pub detail: Option<String>,
    pub loaded_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ArtifactPredictionService {
    /// Load artifacts from `dir`.
    ///
    /// A load failure is logged and yields a degraded service rather than an
    /// error: the process stays up and reports the condition per request.
    #[must_use]
    pub fn load(dir: &Path, options: &VerifyOptions) -> Self {
        tracing::info!("Loading artifacts from {:?}...", dir);
        match artifacts::load(dir, options) {
            Ok(loaded) => Self {
                state: ModelState::Ready {
                    scaler: loaded.scaler,
                    classifier: loaded.classifier,
                    loaded_at: loaded.loaded_at,
                },
                strict_columns: false,
            },
            Err(e) => {
                tracing::error!("Failed to load artifacts: {e}");
                tracing::warn!("Serving in degraded mode; every prediction will be refused");
                Self::unavailable(e.to_string())
            }
        }
    }
}

impl<S, C> PredictionService<S, C>
where
    S: Scaler,
    C: Classifier,
{
    /// Create a service over already-loaded artifacts.
    #[must_use]
    pub fn new(scaler: S, classifier: C) -> Self {
        Self {
            state: ModelState::Ready {
                scaler,
                classifier,
                loaded_at: chrono::Utc::now(),
            },
            strict_columns: false,
        }
    }

    /// Create a degraded service that refuses every prediction.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: ModelState::Unavailable {
                reason: reason.into(),
            },
            strict_columns: false,
        }
    }

    /// Disable the reindex fallback: any column mismatch fails the request.
    #[must_use]
    pub fn with_strict_columns(mut self, strict: bool) -> Self {
        self.strict_columns = strict;
        self
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, ModelState::Ready { .. })
    }

    #[must_use]
    pub fn status(&self) -> ServiceStatus {
        match &self.state {
            ModelState::Ready {
                classifier,
                loaded_at,
                ..
            } => ServiceStatus {
                status: "ok",
                model_loaded: true,
                classifier: Some(classifier.kind()),
                detail: None,
                loaded_at: Some(*loaded_at),
            },
            ModelState::Unavailable { reason } => ServiceStatus {
                status: "degraded",
                model_loaded: false,
                classifier: None,
                detail: Some(reason.clone()),
                loaded_at: None,
            },
        }
    }

    /// Run the prediction pipeline for one patient.
    ///
    /// # Errors
    /// - `ModelUnavailable` if artifacts failed to load (checked first)
    /// - `Validation` if the input is out of domain
    /// - `FeatureMismatch` if scaling fails after the reindex retry
    /// - `Prediction` if the classifier yields an invalid probability
    pub fn predict(&self, input: &PatientInput) -> Result<PredictionResult> {
        let (scaler, classifier) = match &self.state {
            ModelState::Ready {
                scaler, classifier, ..
            } => (scaler, classifier),
            ModelState::Unavailable { reason } => {
                return Err(CardioRiskError::ModelUnavailable(reason.clone()));
            }
        };

        input.validate().map_err(CardioRiskError::Validation)?;

        tracing::debug!("Step 1: Encoding features...");
        let features = FeatureVector::encode(input);

        tracing::debug!("Step 2: Scaling features...");
        let scaled = self.scale(scaler, &features)?;
        if scaled.len() != classifier.num_features() {
            return Err(CardioRiskError::FeatureMismatch(ScaleError::Shape {
                columns: classifier.num_features(),
                values: scaled.len(),
            }));
        }

        tracing::debug!("Step 3: Classifying...");
        let classification = classifier.classify(&scaled);
        let probability = classification.probability;
        if !(0.0..=1.0).contains(&probability) {
            return Err(CardioRiskError::Prediction(format!(
                "classifier produced probability {probability} outside [0, 1]"
            )));
        }

        let risk = RiskLevel::from_probability(probability);
        let factors = risk_factors(input, features.bmi());

        tracing::info!(
            "Prediction complete: risk={}, probability={:.4}, label={}, classifier={}, n_factors={}",
            risk,
            probability,
            classification.label,
            classifier.kind(),
            factors.len()
        );

        Ok(PredictionResult {
            risk,
            probability,
            factors,
            model_used: model_display_name(&input.model_choice).to_string(),
        })
    }

    fn scale(&self, scaler: &S, features: &FeatureVector) -> Result<Vec<f64>> {
        let first_err = match scaler.transform(&FEATURE_COLUMNS, features.as_slice()) {
            Ok(scaled) => return Ok(scaled),
            Err(e) => e,
        };
        if self.strict_columns {
            return Err(CardioRiskError::FeatureMismatch(first_err));
        }

        let expected = scaler.feature_names();
        let missing: Vec<&str> = expected
            .iter()
            .map(String::as_str)
            .filter(|c| !FEATURE_COLUMNS.contains(c))
            .collect();
        let dropped: Vec<&str> = FEATURE_COLUMNS
            .iter()
            .copied()
            .filter(|c| !expected.iter().any(|e| e == c))
            .collect();
        tracing::warn!(
            "Scaler rejected feature columns ({first_err}); reindexing (zero-filled: {:?}, dropped: {:?})",
            missing,
            dropped
        );

        let columns: Vec<&str> = expected.iter().map(String::as_str).collect();
        let values = features.reindex(expected);
        scaler
            .transform(&columns, &values)
            .map_err(CardioRiskError::FeatureMismatch)
    }
}
