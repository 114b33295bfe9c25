//! Standard scaler artifact.

use serde::{Deserialize, Serialize};

use super::ArtifactError;
use crate::ports::{ScaleError, Scaler};

/// Per-feature standardization exported from the training pipeline.
///
/// Mirrors a fitted `StandardScaler`: `feature_names_in`, `mean` and
/// `scale` (standard deviation) all share one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub feature_names_in: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Sanity-check parameter shapes and values.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let n = self.feature_names_in.len();
        if n == 0 {
            return Err(ArtifactError::Invalid("scaler has no features".into()));
        }
        if self.mean.len() != n || self.scale.len() != n {
            return Err(ArtifactError::Invalid(format!(
                "scaler parameter lengths (mean={}, scale={}) do not match {n} feature names",
                self.mean.len(),
                self.scale.len()
            )));
        }
        for (i, name) in self.feature_names_in.iter().enumerate() {
            if self.feature_names_in[..i].contains(name) {
                return Err(ArtifactError::Invalid(format!(
                    "duplicate scaler feature {name:?}"
                )));
            }
            if !self.mean[i].is_finite() {
                return Err(ArtifactError::Invalid(format!(
                    "non-finite mean for {name:?}"
                )));
            }
            if !(self.scale[i].is_finite() && self.scale[i] > 0.0) {
                return Err(ArtifactError::Invalid(format!(
                    "scale for {name:?} must be finite and > 0, got {}",
                    self.scale[i]
                )));
            }
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn feature_names(&self) -> &[String] {
        &self.feature_names_in
    }

    fn transform(&self, columns: &[&str], values: &[f64]) -> Result<Vec<f64>, ScaleError> {
        if columns.len() != values.len() {
            return Err(ScaleError::Shape {
                columns: columns.len(),
                values: values.len(),
            });
        }

        let matches = columns.len() == self.feature_names_in.len()
            && columns
                .iter()
                .zip(&self.feature_names_in)
                .all(|(got, want)| *got == want.as_str());
        if !matches {
            return Err(ScaleError::ColumnMismatch {
                expected: self.feature_names_in.clone(),
                actual: columns.iter().map(|c| (*c).to_string()).collect(),
            });
        }

        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler() -> StandardScaler {
        StandardScaler {
            feature_names_in: vec!["age".into(), "bmi".into()],
            mean: vec![50.0, 25.0],
            scale: vec![10.0, 5.0],
        }
    }

    #[test]
    fn test_transform_standardizes() {
        let out = scaler()
            .transform(&["age", "bmi"], &[60.0, 20.0])
            .expect("Should scale");
        assert!((out[0] - 1.0).abs() < 1e-12);
        assert!((out[1] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_rejects_reordered_columns() {
        let err = scaler()
            .transform(&["bmi", "age"], &[20.0, 60.0])
            .expect_err("Should reject");
        assert!(matches!(err, ScaleError::ColumnMismatch { .. }));
    }

    #[test]
    fn test_transform_rejects_shape_mismatch() {
        let err = scaler()
            .transform(&["age", "bmi"], &[60.0])
            .expect_err("Should reject");
        assert_eq!(err, ScaleError::Shape { columns: 2, values: 1 });
    }

    #[test]
    fn test_validate() {
        assert!(scaler().validate().is_ok());

        let mut zero_scale = scaler();
        zero_scale.scale[1] = 0.0;
        assert!(zero_scale.validate().is_err());

        let mut short = scaler();
        short.mean.pop();
        assert!(short.validate().is_err());

        let mut duplicate = scaler();
        duplicate.feature_names_in[1] = "age".into();
        assert!(duplicate.validate().is_err());
    }
}
