//! Wallet Trust Score API Library
//!
//! Scores blockchain wallets on an integer 1–100 scale from four observable
//! features. The `train-model` binary fits a gradient-boosted tree model on a
//! reproducible synthetic batch and persists it; the `trust-score-api` binary
//! loads that artifact once at startup and serves `POST /score`.
//!
//! # Modules
//!
//! - `artifact`: Atomic model persistence and validated loading.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `gbdt`: Gradient-boosted regression trees.
//! - `handlers`: HTTP request handlers and routes.
//! - `labels`: Synthetic feature generation and batch label scaling.
//! - `models`: Request, training and response data models.
//! - `regressor`: Fit/predict capability traits.
//! - `schema`: The ordered feature schema shared by training and inference.
//! - `scorer`: Startup model loading and the inference operation.
//! - `training`: The end-to-end offline training run.

pub mod artifact;
pub mod config;
pub mod errors;
pub mod gbdt;
pub mod handlers;
pub mod labels;
pub mod models;
pub mod regressor;
pub mod schema;
pub mod scorer;
pub mod training;
