use serde::{Deserialize, Serialize};

use crate::schema::{FeatureVector, FEATURE_COUNT};

/// Minimum loss reduction required to keep a split.
const MIN_SPLIT_GAIN: f64 = 1e-12;

/// A node in the flattened tree. Children are indices into the tree's node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Rows with `row[feature] < threshold` go left, all others right.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Growth limits for a single regression tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// L2 penalty on leaf weights (`sum / (count + lambda)`).
    pub l2_regularization: f64,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    left_count: usize,
}

/// Least-squares regression tree grown greedily to a fixed depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Fits a tree to `targets` (the current residuals) over all `rows`.
    pub fn fit(rows: &[FeatureVector], targets: &[f64], params: &TreeParams) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let indices: Vec<usize> = (0..rows.len()).collect();
        tree.grow(rows, targets, indices, 0, params);
        tree
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match nodes.get(id) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Walks from the root to a leaf. A malformed child index ends the walk
    /// with 0.0 so a bad artifact cannot panic the scorer.
    pub fn predict(&self, row: &FeatureVector) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes.get(id) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(f64::NAN);
                    id = if value < *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    /// Checks that every child index points forward to an existing node and
    /// every split reads a valid feature position.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(format!("node {} splits on unknown feature {}", id, feature));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", id));
                    }
                    for child in [left, right] {
                        if *child <= id || *child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child {}", id, child));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {} has a non-finite value", id));
                    }
                }
            }
        }
        Ok(())
    }

    fn grow(
        &mut self,
        rows: &[FeatureVector],
        targets: &[f64],
        indices: Vec<usize>,
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let id = self.nodes.len();
        let sum: f64 = indices.iter().map(|&i| targets[i]).sum();
        let leaf_value = sum / (indices.len() as f64 + params.l2_regularization);
        self.nodes.push(Node::Leaf { value: leaf_value });

        if depth >= params.max_depth || indices.len() < params.min_samples_split {
            return id;
        }

        let Some(split) = best_split(rows, targets, &indices, sum, params.l2_regularization)
        else {
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| rows[i][split.feature] < split.threshold);
        debug_assert_eq!(left_rows.len(), split.left_count);

        let left = self.grow(rows, targets, left_rows, depth + 1, params);
        let right = self.grow(rows, targets, right_rows, depth + 1, params);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }
}

/// Exact greedy search over every boundary between distinct feature values.
fn best_split(
    rows: &[FeatureVector],
    targets: &[f64],
    indices: &[usize],
    total: f64,
    lambda: f64,
) -> Option<SplitCandidate> {
    let n = indices.len();
    let parent_score = total * total / (n as f64 + lambda);
    let mut best: Option<SplitCandidate> = None;
    let mut sorted = indices.to_vec();

    for feature in 0..FEATURE_COUNT {
        sorted.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

        let mut left_sum = 0.0;
        for k in 0..n.saturating_sub(1) {
            left_sum += targets[sorted[k]];
            let current = rows[sorted[k]][feature];
            let next = rows[sorted[k + 1]][feature];
            if current == next {
                continue;
            }

            let left_count = k + 1;
            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / (left_count as f64 + lambda)
                + right_sum * right_sum / ((n - left_count) as f64 + lambda)
                - parent_score;

            let improves = match best {
                Some(b) => gain > b.gain,
                None => gain > MIN_SPLIT_GAIN,
            };
            if improves {
                best = Some(SplitCandidate {
                    feature,
                    threshold: split_threshold(current, next),
                    gain,
                    left_count,
                });
            }
        }
    }

    best
}

/// Midpoint between two adjacent distinct values, falling back to the upper
/// value when the midpoint rounds onto the lower one.
fn split_threshold(lower: f64, upper: f64) -> f64 {
    let mid = lower + (upper - lower) / 2.0;
    if mid > lower {
        mid
    } else {
        upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: TreeParams = TreeParams {
        max_depth: 3,
        min_samples_split: 2,
        l2_regularization: 0.0,
    };

    fn row(x: f64) -> FeatureVector {
        [x, 0.0, 0.0, 0.0]
    }

    #[test]
    fn test_step_function_is_learned_exactly() {
        let rows: Vec<FeatureVector> = (0..10).map(|i| row(i as f64)).collect();
        let targets: Vec<f64> = (0..10).map(|i| if i < 5 { -1.0 } else { 1.0 }).collect();

        let tree = RegressionTree::fit(&rows, &targets, &PARAMS);

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(&row(2.0)), -1.0);
        assert_eq!(tree.predict(&row(7.0)), 1.0);
        match &tree.nodes()[0] {
            Node::Split {
                feature, threshold, ..
            } => {
                assert_eq!(*feature, 0);
                assert_eq!(*threshold, 4.5);
            }
            other => panic!("expected root split, got {:?}", other),
        }
    }

    #[test]
    fn test_constant_targets_produce_single_leaf() {
        let rows: Vec<FeatureVector> = (0..8).map(|i| row(i as f64)).collect();
        let tree = RegressionTree::fit(&rows, &[3.0; 8], &PARAMS);
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.predict(&row(100.0)), 3.0);
    }

    #[test]
    fn test_depth_limit_is_respected() {
        let rows: Vec<FeatureVector> = (0..64).map(|i| row(i as f64)).collect();
        let targets: Vec<f64> = (0..64).map(|i| (i * i) as f64).collect();
        let tree = RegressionTree::fit(&rows, &targets, &PARAMS);
        assert_eq!(tree.depth(), 3);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_l2_regularization_shrinks_leaves() {
        let rows = vec![row(0.0), row(1.0)];
        let params = TreeParams {
            max_depth: 0,
            min_samples_split: 2,
            l2_regularization: 2.0,
        };
        let tree = RegressionTree::fit(&rows, &[4.0, 4.0], &params);
        assert_eq!(tree.predict(&row(0.0)), 2.0);
    }

    #[test]
    fn test_split_threshold_between_adjacent_floats() {
        let lower = 1.0_f64;
        let upper = f64::from_bits(lower.to_bits() + 1);
        let threshold = split_threshold(lower, upper);
        assert!(lower < threshold);
        assert!(!(upper < threshold));
    }

    #[test]
    fn test_validate_rejects_bad_children() {
        let tree = RegressionTree::from_nodes(vec![Node::Split {
            feature: 0,
            threshold: 1.0,
            left: 1,
            right: 5,
        }]);
        assert!(tree.validate().is_err());

        let tree = RegressionTree::from_nodes(vec![Node::Split {
            feature: 9,
            threshold: 1.0,
            left: 1,
            right: 2,
        }]);
        assert!(tree.validate().is_err());
    }
}
