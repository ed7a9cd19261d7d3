use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use crate::errors::TrainingError;
use crate::regressor::{Predictor, Regressor};
use crate::schema::FeatureVector;

/// Hyperparameters of the squared-error boosting run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientBoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub l2_regularization: f64,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 5,
            min_samples_split: 2,
            l2_regularization: 1.0,
        }
    }
}

impl GradientBoostingParams {
    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            l2_regularization: self.l2_regularization,
        }
    }
}

/// Fitted ensemble: `base_score + learning_rate * Σ tree(row)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    base_score: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    pub fn new(base_score: f64, learning_rate: f64, trees: Vec<RegressionTree>) -> Self {
        Self {
            base_score,
            learning_rate,
            trees,
        }
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Structural check run on models read back from disk.
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_score.is_finite() || !self.learning_rate.is_finite() {
            return Err("non-finite ensemble parameters".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }
}

impl Predictor for GradientBoostedTrees {
    fn predict_row(&self, row: &FeatureVector) -> f64 {
        let boost: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        self.base_score + self.learning_rate * boost
    }
}

impl Regressor for GradientBoostingParams {
    type Model = GradientBoostedTrees;

    fn fit(
        &self,
        rows: &[FeatureVector],
        targets: &[f64],
    ) -> Result<GradientBoostedTrees, TrainingError> {
        if rows.len() != targets.len() {
            return Err(TrainingError::ShapeMismatch {
                rows: rows.len(),
                targets: targets.len(),
            });
        }
        if rows.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }

        let base_score = targets.iter().sum::<f64>() / targets.len() as f64;
        let mut predictions = vec![base_score; targets.len()];
        let mut residuals = vec![0.0; targets.len()];
        let mut trees = Vec::with_capacity(self.n_estimators);
        let tree_params = self.tree_params();

        for round in 0..self.n_estimators {
            for ((r, y), p) in residuals.iter_mut().zip(targets).zip(&predictions) {
                *r = y - p;
            }

            let tree = RegressionTree::fit(rows, &residuals, &tree_params);
            for (p, row) in predictions.iter_mut().zip(rows) {
                *p += self.learning_rate * tree.predict(row);
            }
            trees.push(tree);

            if (round + 1) % 25 == 0 {
                let mse = predictions
                    .iter()
                    .zip(targets)
                    .map(|(p, y)| (p - y).powi(2))
                    .sum::<f64>()
                    / targets.len() as f64;
                tracing::debug!("Boosting round {}: training MSE {:.4}", round + 1, mse);
            }
        }

        Ok(GradientBoostedTrees::new(
            base_score,
            self.learning_rate,
            trees,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_dataset() -> (Vec<FeatureVector>, Vec<f64>) {
        let rows: Vec<FeatureVector> = (0..200)
            .map(|i| {
                let x = i as f64;
                [x, (i % 7) as f64, (i % 2) as f64, 0.0]
            })
            .collect();
        let targets = rows.iter().map(|r| 0.5 * r[0] + 3.0 * r[2]).collect();
        (rows, targets)
    }

    #[test]
    fn test_default_hyperparameters() {
        let params = GradientBoostingParams::default();
        assert_eq!(params.n_estimators, 100);
        assert_eq!(params.learning_rate, 0.1);
        assert_eq!(params.max_depth, 5);
    }

    #[test]
    fn test_fit_reduces_error() {
        let (rows, targets) = linear_dataset();
        let model = GradientBoostingParams::default().fit(&rows, &targets).unwrap();

        assert_eq!(model.trees().len(), 100);
        let mse: f64 = model
            .predict(&rows)
            .iter()
            .zip(&targets)
            .map(|(p, y)| (p - y).powi(2))
            .sum::<f64>()
            / targets.len() as f64;
        let variance: f64 = {
            let mean = targets.iter().sum::<f64>() / targets.len() as f64;
            targets.iter().map(|y| (y - mean).powi(2)).sum::<f64>() / targets.len() as f64
        };
        assert!(mse < variance * 0.05, "mse {} vs variance {}", mse, variance);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (rows, targets) = linear_dataset();
        let params = GradientBoostingParams {
            n_estimators: 10,
            ..Default::default()
        };
        assert_eq!(
            params.fit(&rows, &targets).unwrap(),
            params.fit(&rows, &targets).unwrap()
        );
    }

    #[test]
    fn test_zero_estimators_predicts_mean() {
        let params = GradientBoostingParams {
            n_estimators: 0,
            ..Default::default()
        };
        let model = params
            .fit(&[[0.0; 4], [1.0; 4]], &[10.0, 20.0])
            .unwrap();
        assert_eq!(model.predict_row(&[5.0; 4]), 15.0);
    }

    #[test]
    fn test_fit_rejects_bad_shapes() {
        let params = GradientBoostingParams::default();
        assert!(matches!(
            params.fit(&[[0.0; 4]], &[1.0, 2.0]),
            Err(TrainingError::ShapeMismatch { rows: 1, targets: 2 })
        ));
        assert!(matches!(
            params.fit(&[], &[]),
            Err(TrainingError::EmptyDataset)
        ));
    }

    #[test]
    fn test_serde_preserves_predictions() {
        let (rows, targets) = linear_dataset();
        let params = GradientBoostingParams {
            n_estimators: 5,
            ..Default::default()
        };
        let model = params.fit(&rows, &targets).unwrap();
        let restored: GradientBoostedTrees =
            serde_json::from_str(&serde_json::to_string(&model).unwrap()).unwrap();
        assert!(restored.validate().is_ok());
        for row in rows.iter().step_by(17) {
            assert_eq!(model.predict_row(row), restored.predict_row(row));
        }
    }
}
