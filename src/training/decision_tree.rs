//! Binary Gini decision tree
//!
//! Trees are grown on a set of row indices into a shared feature matrix so
//! a bootstrap sample never copies the data. Split search sorts the node's
//! samples once per candidate feature and sweeps class counts.

use crate::error::{InferenceError, RetentionError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node. Children are indices into the tree's node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding the class counts of the samples that reached it
    Leaf { positives: usize, n_samples: usize },
    /// Internal node: samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: usize,
        right: usize,
        n_samples: usize,
        impurity: f64,
    },
}

impl TreeNode {
    /// Majority class of a leaf. Ties go to class 0.
    fn vote(positives: usize, n_samples: usize) -> u8 {
        u8::from(positives * 2 > n_samples)
    }
}

/// A node still to be grown: its slot in the node list and its samples.
struct PendingNode {
    slot: usize,
    indices: Vec<usize>,
    depth: usize,
}

/// Decision tree classifier over labels in {0, 1}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Nodes in growth order; the root is at index 0
    nodes: Vec<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features examined per split before settling for the best found
    pub max_features: Option<usize>,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set the number of features examined per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Fit on every row of `x`.
    pub fn fit<R: Rng>(&mut self, x: &Array2<f64>, y: &Array1<u8>, rng: &mut R) -> Result<&mut Self> {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_indices(x, y, indices, rng)
    }

    /// Fit on the rows named by `indices`. Repeated indices weigh a row more,
    /// which is how bootstrap samples are passed in.
    pub fn fit_indices<R: Rng>(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<u8>,
        indices: Vec<usize>,
        rng: &mut R,
    ) -> Result<&mut Self> {
        if x.nrows() != y.len() {
            return Err(RetentionError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if indices.is_empty() {
            return Err(RetentionError::TrainingError(
                "cannot grow a tree on zero samples".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        self.nodes = self.grow(x, y, indices, rng, &mut importances);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    /// Grow the tree depth-first with an explicit work stack.
    ///
    /// The left child is always finished before its right sibling, so the
    /// random stream is consumed in pre-order.
    fn grow<R: Rng>(
        &self,
        x: &Array2<f64>,
        y: &Array1<u8>,
        indices: Vec<usize>,
        rng: &mut R,
        importances: &mut [f64],
    ) -> Vec<TreeNode> {
        let placeholder = TreeNode::Leaf { positives: 0, n_samples: 0 };
        let mut nodes = vec![placeholder.clone()];
        let mut pending = vec![PendingNode { slot: 0, indices, depth: 0 }];

        while let Some(PendingNode { slot, indices, depth }) = pending.pop() {
            let n_samples = indices.len();
            let positives = indices.iter().filter(|&&i| y[i] == 1).count();

            let should_stop = n_samples < self.min_samples_split
                || n_samples < 2 * self.min_samples_leaf
                || self.max_depth.is_some_and(|d| depth >= d)
                || positives == 0
                || positives == n_samples;

            let split = if should_stop {
                None
            } else {
                self.find_best_split(x, y, &indices, rng)
            };
            let Some((feature_idx, threshold, gain)) = split else {
                nodes[slot] = TreeNode::Leaf { positives, n_samples };
                continue;
            };

            // Stable partition: left block keeps x <= threshold
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .into_iter()
                .partition(|&i| x[[i, feature_idx]] <= threshold);

            importances[feature_idx] += n_samples as f64 * gain;

            let left_slot = nodes.len();
            let right_slot = left_slot + 1;
            nodes.push(placeholder.clone());
            nodes.push(placeholder.clone());
            nodes[slot] = TreeNode::Split {
                feature_idx,
                threshold,
                left: left_slot,
                right: right_slot,
                n_samples,
                impurity: gini(positives, n_samples),
            };

            pending.push(PendingNode { slot: right_slot, indices: right, depth: depth + 1 });
            pending.push(PendingNode { slot: left_slot, indices: left, depth: depth + 1 });
        }

        nodes
    }

    /// Best `(feature, threshold, gain)` among a random subset of features.
    ///
    /// Features are visited in a shuffled order. After `max_features` of them
    /// the search stops as soon as some split with positive gain exists.
    fn find_best_split<R: Rng>(
        &self,
        x: &Array2<f64>,
        y: &Array1<u8>,
        indices: &[usize],
        rng: &mut R,
    ) -> Option<(usize, f64, f64)> {
        let n_features = x.ncols();
        let max_features = self.max_features.unwrap_or(n_features).min(n_features);

        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);

        let n = indices.len();
        let total_pos = indices.iter().filter(|&&i| y[i] == 1).count();
        let parent_impurity = gini(total_pos, n);

        let mut best: Option<(usize, f64, f64)> = None;
        let mut pairs: Vec<(f64, u8)> = Vec::with_capacity(n);

        for (visited, &feature_idx) in features.iter().enumerate() {
            if visited >= max_features && best.is_some() {
                break;
            }

            pairs.clear();
            pairs.extend(indices.iter().map(|&i| (x[[i, feature_idx]], y[i])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_n = 0usize;
            let mut left_pos = 0usize;
            for k in 0..n - 1 {
                left_n += 1;
                left_pos += pairs[k].1 as usize;

                let (lo, hi) = (pairs[k].0, pairs[k + 1].0);
                if lo == hi {
                    continue;
                }
                let right_n = n - left_n;
                if left_n < self.min_samples_leaf || right_n < self.min_samples_leaf {
                    continue;
                }

                let right_pos = total_pos - left_pos;
                let weighted = (left_n as f64 * gini(left_pos, left_n)
                    + right_n as f64 * gini(right_pos, right_n))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if gain > best.map_or(0.0, |b| b.2) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some((feature_idx, threshold, gain));
                }
            }
        }

        best
    }

    /// Class vote for one sample.
    pub fn predict_row(&self, sample: ArrayView1<f64>) -> std::result::Result<u8, InferenceError> {
        if self.nodes.is_empty() {
            return Err(InferenceError::NotFitted);
        }
        if sample.len() != self.n_features {
            return Err(InferenceError::FeatureCount {
                expected: self.n_features,
                actual: sample.len(),
            });
        }

        let mut at = 0;
        loop {
            match &self.nodes[at] {
                TreeNode::Leaf { positives, n_samples } => {
                    return Ok(TreeNode::vote(*positives, *n_samples));
                }
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    at = if sample[*feature_idx] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Class votes for every row of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> std::result::Result<Array1<u8>, InferenceError> {
        x.outer_iter()
            .map(|row| self.predict_row(row))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Array1::from_vec)
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Get tree depth, counting the root level as 1
    pub fn get_depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut deepest = 0;
        let mut stack = vec![(0usize, 1usize)];
        while let Some((at, level)) = stack.pop() {
            deepest = deepest.max(level);
            if let TreeNode::Split { left, right, .. } = &self.nodes[at] {
                stack.push((*left, level + 1));
                stack.push((*right, level + 1));
            }
        }
        deepest
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }
}

fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}
