//! Synthetic training data.
//!
//! There is no historical repayment data, so the trainer fits against a
//! reproducible batch drawn from the schema's sampling ranges and labelled
//! with the weighted raw formula, min-max scaled across the whole batch.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::errors::TrainingError;
use crate::models::{BorrowerFeatures, TrainingSample};
use crate::schema::{self, FeatureVector, FieldDescriptor, FieldKind, FEATURE_SCHEMA};

/// Rows in the synthetic batch.
pub const SAMPLE_COUNT: usize = 1000;
/// Seed for both data generation and the train/test split.
pub const SEED: u64 = 42;

/// Builds the fixed synthetic dataset used by the trainer.
pub fn generate_dataset() -> Result<Vec<TrainingSample>, TrainingError> {
    label_batch(generate_features(SAMPLE_COUNT, SEED))
}

/// Draws `count` borrowers, one schema column at a time.
pub fn generate_features(count: usize, seed: u64) -> Vec<BorrowerFeatures> {
    let mut rng = StdRng::seed_from_u64(seed);
    let columns: Vec<Vec<f64>> = FEATURE_SCHEMA
        .iter()
        .map(|field| sample_column(field, count, &mut rng))
        .collect();

    (0..count)
        .map(|row| {
            let vector: FeatureVector = std::array::from_fn(|col| columns[col][row]);
            schema::from_vector(&vector)
        })
        .collect()
}

fn sample_column(field: &FieldDescriptor, count: usize, rng: &mut StdRng) -> Vec<f64> {
    (0..count)
        .map(|_| match field.kind {
            FieldKind::Integer => rng.gen_range(field.min as i64..=field.max as i64) as f64,
            FieldKind::Real => rng.gen_range(field.min..=field.max),
            FieldKind::Boolean => {
                if rng.gen_bool(0.5) {
                    1.0
                } else {
                    0.0
                }
            }
        })
        .collect()
}

/// Scores every borrower and scales the batch into integer labels.
pub fn label_batch(features: Vec<BorrowerFeatures>) -> Result<Vec<TrainingSample>, TrainingError> {
    let raw_scores: Vec<f64> = features.iter().map(schema::raw_score).collect();
    let labels = scale_labels(&raw_scores)?;

    Ok(features
        .into_iter()
        .zip(raw_scores)
        .zip(labels)
        .map(|((features, raw_score), label)| TrainingSample {
            features,
            raw_score,
            label,
        })
        .collect())
}

/// Min-max scales raw scores onto `[1, 100]`, truncating to integers.
///
/// Scaling is relative to the batch: its minimum becomes exactly 1 and its
/// maximum exactly 100. A batch with no spread cannot be scaled.
pub fn scale_labels(raw_scores: &[f64]) -> Result<Vec<u8>, TrainingError> {
    if raw_scores.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }

    let (min, max) = raw_scores
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
            (lo.min(r), hi.max(r))
        });

    let all_finite = raw_scores.iter().all(|r| r.is_finite());
    if !all_finite || !(max > min) {
        return Err(TrainingError::DegenerateTrainingBatch { min, max });
    }

    let span = max - min;
    Ok(raw_scores
        .iter()
        .map(|&raw| (1.0 + 99.0 * ((raw - min) / span)).trunc() as u8)
        .collect())
}
