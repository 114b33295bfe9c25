//! Feature reconstruction: raw patient input to the model's feature vector.
//!
//! The scaler and classifier were fit offline on a frame built with
//! `get_dummies(columns=[cholesterol, gluc, gender], drop_first=True)`.
//! Both artifacts are positional, so the vector produced here must follow
//! [`FEATURE_COLUMNS`] exactly.

use super::patient::PatientInput;

/// Number of features consumed by the scaler and classifier.
pub const NUM_FEATURES: usize = 13;

/// Column names and order the artifacts were trained on.
pub const FEATURE_COLUMNS: [&str; NUM_FEATURES] = [
    "age",
    "ap_hi",
    "ap_lo",
    "smoke",
    "alco",
    "active",
    "bmi",
    "pulse_pressure",
    "cholesterol_2",
    "cholesterol_3",
    "gluc_2",
    "gluc_3",
    "gender_2",
];

/// Fixed-order numeric representation of one patient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; NUM_FEATURES],
}

impl FeatureVector {
    /// Encode raw input into the 13-slot vector.
    ///
    /// Total over any input: undeclared categorical values fall back to the
    /// baseline category (female, level "1", "no").
    #[must_use]
    pub fn encode(input: &PatientInput) -> Self {
        let (cholesterol_2, cholesterol_3) = level_flags(&input.cholesterol);
        let (gluc_2, gluc_3) = level_flags(&input.glucose);

        Self {
            values: [
                input.age as f64,
                input.systolic_bp as f64,
                input.diastolic_bp as f64,
                yes_flag(&input.smoker),
                yes_flag(&input.drinks_alcohol),
                yes_flag(&input.physically_active),
                bmi(input.height, input.weight),
                pulse_pressure(input.systolic_bp, input.diastolic_bp),
                cholesterol_2,
                cholesterol_3,
                gluc_2,
                gluc_3,
                male_flag(&input.gender),
            ],
        }
    }

    /// Values in [`FEATURE_COLUMNS`] order.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Value of a named column, if it is one of [`FEATURE_COLUMNS`].
    #[must_use]
    pub fn get(&self, column: &str) -> Option<f64> {
        FEATURE_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| self.values[i])
    }

    /// Reorder to `columns`, filling any column this vector lacks with 0.
    ///
    /// Columns of this vector that `columns` does not name are dropped.
    #[must_use]
    pub fn reindex<S: AsRef<str>>(&self, columns: &[S]) -> Vec<f64> {
        columns
            .iter()
            .map(|c| self.get(c.as_ref()).unwrap_or(0.0))
            .collect()
    }

    #[must_use]
    pub fn bmi(&self) -> f64 {
        self.values[6]
    }
}

/// Body mass index from height in centimeters and weight in kilograms.
#[must_use]
pub fn bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Systolic minus diastolic. Negative values pass through unchanged.
///
/// Computed in floating point so extreme readings cannot overflow.
#[must_use]
pub fn pulse_pressure(systolic: i64, diastolic: i64) -> f64 {
    systolic as f64 - diastolic as f64
}

fn yes_flag(value: &str) -> f64 {
    if value == "yes" {
        1.0
    } else {
        0.0
    }
}

fn male_flag(value: &str) -> f64 {
    if value == "male" {
        1.0
    } else {
        0.0
    }
}

// Level "1" is the dropped baseline.
fn level_flags(value: &str) -> (f64, f64) {
    match value {
        "2" => (1.0, 0.0),
        "3" => (0.0, 1.0),
        _ => (0.0, 0.0),
    }
}
