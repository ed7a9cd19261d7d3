//! Offline training run: synthetic batch, hold-out split, fit, report, persist.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::path::Path;

use crate::artifact::{self, ModelArtifact};
use crate::errors::TrainingError;
use crate::gbdt::GradientBoostingParams;
use crate::labels::{self, SEED};
use crate::models::TrainingSample;
use crate::regressor::{Predictor, Regressor};
use crate::schema::{self, FeatureVector};

/// Share of the batch held out for the quality report.
pub const TEST_FRACTION: f64 = 0.2;

/// Summary of a finished training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub train_samples: usize,
    pub test_samples: usize,
    /// Informational only; the model is saved whatever its value.
    pub test_r2: f64,
    pub tree_count: usize,
}

/// Shuffles with `seed` and splits off `ceil(len * test_fraction)` rows for testing.
pub fn train_test_split(
    samples: &[TrainingSample],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<TrainingSample>, Vec<TrainingSample>), TrainingError> {
    let test_len = (samples.len() as f64 * test_fraction).ceil() as usize;
    if test_len == 0 || test_len >= samples.len() {
        return Err(TrainingError::EmptyDataset);
    }

    let mut order: Vec<usize> = (0..samples.len()).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let (test_idx, train_idx) = order.split_at(test_len);
    let pick = |idx: &[usize]| idx.iter().map(|&i| samples[i].clone()).collect::<Vec<_>>();
    Ok((pick(train_idx), pick(test_idx)))
}

/// Coefficient of determination. A constant target gives 1.0 for a perfect
/// fit and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return f64::NAN;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

fn to_matrix(samples: &[TrainingSample]) -> (Vec<FeatureVector>, Vec<f64>) {
    samples
        .iter()
        .map(|s| (schema::vectorize(&s.features), f64::from(s.label)))
        .unzip()
}

/// Fits `regressor` on the training share and scores it on the held-out share.
pub fn fit_and_evaluate<R: Regressor>(
    regressor: &R,
    train: &[TrainingSample],
    test: &[TrainingSample],
) -> Result<(R::Model, f64), TrainingError> {
    let (train_rows, train_targets) = to_matrix(train);
    let model = regressor.fit(&train_rows, &train_targets)?;

    let (test_rows, test_targets) = to_matrix(test);
    let r2 = r2_score(&test_targets, &model.predict(&test_rows));
    Ok((model, r2))
}

/// Trains on the fixed synthetic batch and persists the artifact to `path`.
pub fn run(path: &Path) -> Result<TrainingReport, TrainingError> {
    tracing::info!("Generating synthetic data...");
    let samples = labels::generate_dataset()?;
    let (train, test) = train_test_split(&samples, TEST_FRACTION, SEED)?;
    tracing::info!(
        "Generated {} samples ({} train / {} test)",
        samples.len(),
        train.len(),
        test.len()
    );

    let params = GradientBoostingParams::default();
    tracing::info!(
        "Training gradient-boosted trees ({} trees, learning rate {}, max depth {})...",
        params.n_estimators,
        params.learning_rate,
        params.max_depth
    );
    let (model, test_r2) = fit_and_evaluate(&params, &train, &test)?;
    tracing::info!("Model trained. Test score (R^2): {:.4}", test_r2);

    let report = TrainingReport {
        train_samples: train.len(),
        test_samples: test.len(),
        test_r2,
        tree_count: model.trees().len(),
    };

    artifact::save(
        &ModelArtifact::new(model, report.train_samples, report.test_samples, test_r2),
        path,
    )?;
    tracing::info!("Model saved successfully to '{}'", path.display());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(n: usize) -> Vec<TrainingSample> {
        labels::label_batch(labels::generate_features(n, SEED)).unwrap()
    }

    #[test]
    fn test_split_sizes_and_disjointness() {
        let data = samples(1000);
        let (train, test) = train_test_split(&data, TEST_FRACTION, SEED).unwrap();
        assert_eq!(train.len(), 800);
        assert_eq!(test.len(), 200);

        let mut all: Vec<f64> = train
            .iter()
            .chain(test.iter())
            .map(|s| s.raw_score)
            .collect();
        all.sort_by(f64::total_cmp);
        let mut expected: Vec<f64> = data.iter().map(|s| s.raw_score).collect();
        expected.sort_by(f64::total_cmp);
        assert_eq!(all, expected);
    }

    #[test]
    fn test_split_rounds_test_share_up() {
        let data = samples(11);
        let (train, test) = train_test_split(&data, TEST_FRACTION, SEED).unwrap();
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_split_is_seeded() {
        let data = samples(100);
        let (a, _) = train_test_split(&data, TEST_FRACTION, SEED).unwrap();
        let (b, _) = train_test_split(&data, TEST_FRACTION, SEED).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_needs_two_rows() {
        let data = samples(2);
        assert!(train_test_split(&data[..1], TEST_FRACTION, SEED).is_err());
    }

    #[test]
    fn test_r2_score() {
        assert_eq!(r2_score(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0);
        assert_eq!(r2_score(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]), 0.0);
        assert!(r2_score(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) < 0.0);
        assert_eq!(r2_score(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert!(r2_score(&[], &[]).is_nan());
    }

    #[test]
    fn test_fit_and_evaluate_learns_the_labels() {
        let data = samples(1000);
        let (train, test) = train_test_split(&data, TEST_FRACTION, SEED).unwrap();
        let (_, r2) = fit_and_evaluate(&GradientBoostingParams::default(), &train, &test).unwrap();
        assert!(r2 > 0.8, "held-out R^2 was {}", r2);
    }
}
