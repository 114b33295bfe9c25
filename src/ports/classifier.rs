//! Classifier port: pre-fit probabilistic binary classifier.

use crate::domain::Classification;

/// Trait for a fitted binary classifier over scaled features.
pub trait Classifier: Send + Sync {
    /// Short name of the model family (e.g. `logistic_regression`).
    fn kind(&self) -> &'static str;

    /// Number of features the classifier consumes.
    fn num_features(&self) -> usize;

    /// Classify one scaled row.
    ///
    /// Callers must pass exactly [`Classifier::num_features`] values.
    fn classify(&self, scaled: &[f64]) -> Classification;
}
