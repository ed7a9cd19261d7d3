//! Gradient-boosted regression trees.
//!
//! Squared-error boosting over depth-limited least-squares trees with an L2
//! penalty on leaf weights. Fitting is single-threaded and fully
//! deterministic: the same rows and targets always yield the same ensemble.
//! Trees are stored as flat node lists so the whole model serializes to
//! plain JSON.

pub mod model;
pub mod tree;

pub use model::{GradientBoostedTrees, GradientBoostingParams};
pub use tree::{Node, RegressionTree, TreeParams};
