//! Pluggable regression capability.
//!
//! The trainer only needs something that can be fitted on positional feature
//! rows and the scorer only needs something that maps one row to a real
//! number. [`crate::gbdt`] provides the implementation shipped with the
//! service.

use crate::errors::TrainingError;
use crate::schema::FeatureVector;

/// A trainable regression algorithm with fixed hyperparameters.
pub trait Regressor {
    type Model: Predictor;

    fn fit(&self, rows: &[FeatureVector], targets: &[f64]) -> Result<Self::Model, TrainingError>;
}

/// A fitted model.
pub trait Predictor {
    fn predict_row(&self, row: &FeatureVector) -> f64;

    fn predict(&self, rows: &[FeatureVector]) -> Vec<f64> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }
}
