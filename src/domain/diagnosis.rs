//! Prediction result types.
//!
//! Risk tiers come from the classifier probability. Risk factors come from
//! fixed clinical heuristics over the raw input and deliberately ignore the
//! classifier: they may disagree with it.

use serde::{Deserialize, Serialize};

use super::patient::PatientInput;

/// Coarse risk bucket for cardiovascular disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Probability at or below 0.3
    Low,
    /// Probability above 0.3, at most 0.6
    Moderate,
    /// Probability above 0.6
    High,
}

impl RiskLevel {
    /// Bucket a class-1 probability.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.6 {
            Self::High
        } else if probability > 0.3 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Moderate => write!(f, "moderate"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Output of the classifier for a single scaled vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// 0 = no disease, 1 = disease present
    pub label: u8,

    /// Probability of the disease class (0.0 to 1.0)
    pub probability: f64,
}

impl Classification {
    /// Build from a class-1 probability using a 0.5 decision threshold.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        Self {
            label: u8::from(probability >= 0.5),
            probability,
        }
    }
}

/// Qualitative risk factors, in evaluation order.
///
/// `bmi` is passed in rather than recomputed so it always agrees with the
/// value in the feature vector.
#[must_use]
pub fn risk_factors(input: &PatientInput, bmi: f64) -> Vec<String> {
    let rules: [(bool, &str); 7] = [
        (input.age > 55, "Age above 55 years"),
        (input.systolic_bp > 140, "High systolic blood pressure"),
        (input.diastolic_bp > 90, "High diastolic blood pressure"),
        (input.cholesterol != "1", "Elevated cholesterol"),
        (input.glucose != "1", "Elevated glucose"),
        (input.smoker == "yes", "Smoker"),
        (bmi > 25.0, "Overweight/Obese"),
    ];

    rules
        .into_iter()
        .filter(|(fired, _)| *fired)
        .map(|(_, label)| label.to_string())
        .collect()
}

/// Display label for the model the client asked for.
///
/// Cosmetic only. The loaded classifier artifact runs regardless.
#[must_use]
pub fn model_display_name(choice: &str) -> &'static str {
    match choice {
        "logistic_regression" => "Logistic Regression",
        "decision_tree" => "Decision Tree",
        _ => "Random Forest",
    }
}

/// Response returned for a successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub risk: RiskLevel,
    pub probability: f64,
    pub factors: Vec<String>,
    pub model_used: String,
}
