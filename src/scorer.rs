use std::path::Path;

use crate::artifact::{self, ModelArtifact};
use crate::errors::{AppError, ArtifactError};
use crate::models::{BorrowerFeatures, TrustScore};
use crate::regressor::Predictor;
use crate::schema;

/// A model artifact loaded for serving.
#[derive(Debug, Clone)]
pub struct ScoringModel {
    artifact: ModelArtifact,
    fingerprint: String,
}

impl ScoringModel {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let loaded = artifact::load(path)?;
        Ok(Self {
            artifact: loaded.artifact,
            fingerprint: loaded.fingerprint,
        })
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self {
            artifact,
            fingerprint: String::new(),
        }
    }

    /// SHA-256 of the artifact file, hex encoded.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Raw, unclamped model output for one borrower.
    pub fn predict(&self, features: &BorrowerFeatures) -> f64 {
        self.artifact
            .model
            .predict_row(&schema::vectorize(features))
    }
}

/// Process-wide scoring state, built once before the server accepts requests.
///
/// `model` is `None` when the artifact was missing or unusable at startup;
/// the service still runs and every scoring call reports the model as
/// unavailable.
#[derive(Debug, Clone, Default)]
pub struct ScoringContext {
    model: Option<ScoringModel>,
}

impl ScoringContext {
    pub fn new(model: Option<ScoringModel>) -> Self {
        Self { model }
    }

    /// Loads the artifact at `path`.
    ///
    /// Any load failure (missing, unreadable or corrupt) yields a context
    /// without a model; the scorer keeps serving and reports it on `/score`.
    pub fn initialize(path: &Path) -> Self {
        match ScoringModel::load(path) {
            Ok(model) => {
                let meta = model.artifact();
                tracing::info!(
                    "✓ Model loaded from {} (sha256 {}, {} trees, trained {}, test R^2 {})",
                    path.display(),
                    model.fingerprint(),
                    meta.model.trees().len(),
                    meta.trained_at.to_rfc3339(),
                    meta.test_r2
                        .map(|r2| format!("{:.4}", r2))
                        .unwrap_or_else(|| "n/a".to_string())
                );
                Self::new(Some(model))
            }
            Err(e @ ArtifactError::Missing(_)) => {
                tracing::warn!("{}. Run the train-model binary first; scoring is disabled", e);
                Self::new(None)
            }
            Err(e) => {
                tracing::error!("An error occurred while loading the model: {}; scoring is disabled", e);
                Self::new(None)
            }
        }
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&ScoringModel> {
        self.model.as_ref()
    }

    /// Scores one borrower: vectorize, predict, clamp.
    pub fn score(&self, features: &BorrowerFeatures) -> Result<TrustScore, AppError> {
        let model = self.model.as_ref().ok_or(AppError::ModelUnavailable)?;

        let unusual = schema::out_of_range_fields(features);
        if !unusual.is_empty() {
            tracing::debug!("Scoring outside the training range for {:?}", unusual);
        }

        let prediction = model.predict(features);
        let score = TrustScore::clamp(prediction);
        tracing::debug!("Raw prediction {:.4} -> trust score {}", prediction, score);
        Ok(score)
    }
}
