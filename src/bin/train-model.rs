//! Trains the trust score model on the fixed synthetic batch and writes the
//! artifact the scoring service loads at startup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trust_score_api::config::Config;
use trust_score_api::training;

/// Main entry point for the training run.
///
/// Takes no arguments: sample count, seed and hyperparameters are fixed.
/// Only the artifact path comes from `MODEL_PATH`.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "train_model=info,trust_score_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let report = training::run(&config.model_path)?;

    tracing::info!(
        "Training complete: {} trees, {} train / {} test samples, R^2 {:.4}",
        report.tree_count,
        report.train_samples,
        report.test_samples,
        report.test_r2
    );

    Ok(())
}
