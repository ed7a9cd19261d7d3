//! Persisted model artifact.
//!
//! The trainer writes one JSON document holding the fitted ensemble together
//! with the feature layout it was trained on. Writes go to a sibling temp
//! file that is renamed into place, so a reader sees either the previous
//! artifact or the complete new one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::errors::{ArtifactError, TrainingError};
use crate::gbdt::GradientBoostedTrees;
use crate::schema;

/// Bumped whenever the document layout changes incompatibly.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Feature layout the model was fitted on, in vector order.
    pub feature_names: Vec<String>,
    pub trained_at: DateTime<Utc>,
    pub train_samples: usize,
    pub test_samples: usize,
    /// Held-out coefficient of determination, when it was defined.
    pub test_r2: Option<f64>,
    pub model: GradientBoostedTrees,
}

impl ModelArtifact {
    /// Wraps a freshly fitted model with the current schema and metadata.
    pub fn new(
        model: GradientBoostedTrees,
        train_samples: usize,
        test_samples: usize,
        test_r2: f64,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            feature_names: schema::feature_names(),
            trained_at: Utc::now(),
            train_samples,
            test_samples,
            test_r2: test_r2.is_finite().then_some(test_r2),
            model,
        }
    }
}

/// An artifact read back from disk along with the SHA-256 of its bytes.
#[derive(Debug, Clone)]
pub struct LoadedArtifact {
    pub artifact: ModelArtifact,
    pub fingerprint: String,
}

/// Atomically writes `artifact` to `path`.
pub fn save(artifact: &ModelArtifact, path: &Path) -> Result<(), TrainingError> {
    let bytes = serde_json::to_vec_pretty(artifact)?;
    let tmp = temp_path(path);

    write_then_rename(&bytes, &tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        TrainingError::Persist {
            path: path.to_path_buf(),
            source,
        }
    })?;

    tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn write_then_rename(bytes: &[u8], tmp: &Path, path: &Path) -> io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, path)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Reads and checks the artifact at `path`.
///
/// The document must parse, carry the current format version, match the
/// compiled feature schema exactly and contain a structurally valid model.
pub fn load(path: &Path) -> Result<LoadedArtifact, ArtifactError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ArtifactError::Missing(path.to_path_buf()))
        }
        Err(source) => {
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let corrupt = |reason: String| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    let artifact: ModelArtifact =
        serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;

    if artifact.format_version != FORMAT_VERSION {
        return Err(corrupt(format!(
            "unsupported format version {} (expected {})",
            artifact.format_version, FORMAT_VERSION
        )));
    }

    let expected = schema::feature_names();
    if artifact.feature_names != expected {
        return Err(corrupt(format!(
            "feature layout {:?} does not match {:?}",
            artifact.feature_names, expected
        )));
    }

    artifact.model.validate().map_err(corrupt)?;

    Ok(LoadedArtifact {
        artifact,
        fingerprint: hex::encode(Sha256::digest(&bytes)),
    })
}
