//! Ports layer: Traits for the trained artifacts.
//!
//! The scaler and classifier are produced by an offline training pipeline.
//! The application only sees them through these traits, so tests can swap
//! in hand-built implementations.

mod classifier;
mod scaler;

pub use classifier::Classifier;
pub use scaler::{ScaleError, Scaler};
