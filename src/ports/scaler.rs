//! Scaler port: per-feature standardization fit offline.

/// Error returned by [`Scaler::transform`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScaleError {
    /// The named input columns are not the columns the scaler was fit on.
    #[error("column mismatch: scaler expects {expected:?}, got {actual:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// Column names and values have different lengths.
    #[error("got {values} values for {columns} columns")]
    Shape { columns: usize, values: usize },
}

/// Trait for a fitted feature scaler.
pub trait Scaler: Send + Sync {
    /// Column names, in order, the scaler was fit on.
    fn feature_names(&self) -> &[String];

    /// Standardize one row.
    ///
    /// `columns` names each entry of `values`. Implementations must reject
    /// any row whose columns differ from [`Scaler::feature_names`] in name
    /// or order rather than guess an alignment.
    ///
    /// # Errors
    /// Returns `ScaleError::ColumnMismatch` if the columns differ.
    fn transform(&self, columns: &[&str], values: &[f64]) -> Result<Vec<f64>, ScaleError>;
}
