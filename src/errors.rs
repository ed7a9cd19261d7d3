use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use std::path::PathBuf;

/// Message returned to every scoring request while no model is loaded.
pub const MODEL_UNAVAILABLE_MESSAGE: &str = "Model not loaded. Cannot process request.";

/// Request-time error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Malformed request payload (missing or mistyped field).
    Validation(String),
    /// Request body exceeded the configured size limit.
    PayloadTooLarge(String),
    /// The scorer started without a usable model artifact.
    ModelUnavailable,
    /// Internal server error.
    InternalError(String),
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Invalid request: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Request body too large: {}", msg),
            AppError::ModelUnavailable => write!(f, "{}", MODEL_UNAVAILABLE_MESSAGE),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Maps each error variant to an appropriate HTTP status code and JSON body.
    /// Logs errors appropriately based on their severity.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation(msg) => {
                tracing::debug!("Rejected scoring request: {}", msg);
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            AppError::PayloadTooLarge(msg) => {
                tracing::warn!("Rejected oversized request body: {}", msg);
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            AppError::ModelUnavailable => {
                tracing::warn!("Scoring request received while no model is loaded");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    MODEL_UNAVAILABLE_MESSAGE.to_string(),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Failures of the offline training run. All of them abort the run before
/// anything is written to the artifact path.
#[derive(Debug)]
pub enum TrainingError {
    /// Every raw score in the batch is identical (or not a finite number),
    /// so min-max scaling has no range to map onto.
    DegenerateTrainingBatch { min: f64, max: f64 },
    /// No samples to scale, split or fit.
    EmptyDataset,
    /// Feature rows and targets disagree in length.
    ShapeMismatch { rows: usize, targets: usize },
    /// Writing or renaming the artifact file failed.
    Persist { path: PathBuf, source: std::io::Error },
    /// The trained model could not be encoded.
    Serialize(serde_json::Error),
}

impl fmt::Display for TrainingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingError::DegenerateTrainingBatch { min, max } => write!(
                f,
                "Degenerate training batch: raw scores span [{}, {}], cannot scale labels",
                min, max
            ),
            TrainingError::EmptyDataset => write!(f, "Training dataset is empty"),
            TrainingError::ShapeMismatch { rows, targets } => write!(
                f,
                "Feature rows ({}) and targets ({}) differ in length",
                rows, targets
            ),
            TrainingError::Persist { path, source } => {
                write!(f, "Failed to persist model to '{}': {}", path.display(), source)
            }
            TrainingError::Serialize(e) => write!(f, "Failed to serialize model: {}", e),
        }
    }
}

impl std::error::Error for TrainingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrainingError::Persist { source, .. } => Some(source),
            TrainingError::Serialize(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TrainingError {
    fn from(err: serde_json::Error) -> Self {
        TrainingError::Serialize(err)
    }
}

/// Failures while loading the persisted model at scorer startup.
#[derive(Debug)]
pub enum ArtifactError {
    /// No file at the configured path.
    Missing(PathBuf),
    /// The file exists but is not a usable model for this schema.
    Corrupt { path: PathBuf, reason: String },
    /// Reading the file failed for a reason other than absence.
    Io { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactError::Missing(path) => {
                write!(f, "Model file '{}' not found", path.display())
            }
            ArtifactError::Corrupt { path, reason } => {
                write!(f, "Model file '{}' is unusable: {}", path.display(), reason)
            }
            ArtifactError::Io { path, source } => {
                write!(f, "Failed to read model file '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ArtifactError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArtifactError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
