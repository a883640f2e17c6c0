//! Random forest classifier

use crate::error::{InferenceError, RetentionError, Result};
use super::decision_tree::DecisionTree;
use super::metrics::ClassificationReport;
use ndarray::{Array1, Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Churn probability at or above which a customer is labelled as churning.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Random forest over binary labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    /// Individual trees
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features examined per split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Seed of the first tree; tree `i` uses `random_state + i`
    pub random_state: u64,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
    /// Number of features
    n_features: usize,
}

/// Strategy for max features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Log2 of n_features
    Log2,
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: 42,
            feature_importances: None,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set max features strategy
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    fn compute_max_features(&self, n_features: usize) -> usize {
        match self.max_features {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::Fixed(n) => n.min(n_features),
            MaxFeatures::All => n_features,
        }
        .max(1)
    }

    /// Fit the forest. Labels must be 0 or 1.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<u8>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(RetentionError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 || n_features == 0 {
            return Err(RetentionError::TrainingError(format!(
                "cannot fit on an empty matrix ({} x {})",
                n_samples, n_features
            )));
        }
        if self.n_estimators == 0 {
            return Err(RetentionError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: "0".to_string(),
                reason: "a forest needs at least one tree".to_string(),
            });
        }
        if let Some(bad) = y.iter().find(|&&label| label > 1) {
            return Err(RetentionError::TrainingError(format!(
                "labels must be 0 or 1, found {}",
                bad
            )));
        }

        let max_features = self.compute_max_features(n_features);
        let base_seed = self.random_state;

        // Each tree owns its RNG, so the result does not depend on scheduling
        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTree::new()
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_max_features(max_features);
                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }

                tree.fit_indices(x, y, sample_indices, &mut rng)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.n_features = n_features;
        self.compute_feature_importances();

        debug!(
            n_trees = self.trees.len(),
            n_samples,
            n_features,
            max_features,
            "Fitted random forest"
        );

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        if self.trees.is_empty() {
            return;
        }

        let mut total_importances = vec![0.0; self.n_features];
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (total, &val) in total_importances.iter_mut().zip(imp.iter()) {
                    *total += val;
                }
            }
        }

        let total: f64 = total_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut total_importances {
                *imp /= total;
            }
        }

        self.feature_importances = Some(Array1::from_vec(total_importances));
    }

    /// Fraction of trees voting for class 1.
    pub fn predict_proba_row(&self, row: ArrayView1<f64>) -> std::result::Result<f64, InferenceError> {
        if self.trees.is_empty() {
            return Err(InferenceError::NotFitted);
        }
        if row.len() != self.n_features {
            return Err(InferenceError::FeatureCount {
                expected: self.n_features,
                actual: row.len(),
            });
        }

        let mut votes = 0usize;
        for tree in &self.trees {
            votes += tree.predict_row(row)? as usize;
        }
        Ok(votes as f64 / self.trees.len() as f64)
    }

    /// Label and churn probability for one feature vector.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> std::result::Result<(u8, f64), InferenceError> {
        let probability = self.predict_proba_row(row)?;
        Ok((u8::from(probability >= DECISION_THRESHOLD), probability))
    }

    /// Churn probability for every row of `x`.
    pub fn predict_proba(&self, x: &Array2<f64>) -> std::result::Result<Array1<f64>, InferenceError> {
        let rows: Vec<ArrayView1<f64>> = x.outer_iter().collect();
        rows.into_par_iter()
            .map(|row| self.predict_proba_row(row))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Array1::from_vec)
    }

    /// Labels for every row of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> std::result::Result<Array1<u8>, InferenceError> {
        Ok(self
            .predict_proba(x)?
            .mapv(|p| u8::from(p >= DECISION_THRESHOLD)))
    }

    /// Score the forest on a held-out partition.
    pub fn evaluate(&self, x: &Array2<f64>, y: &Array1<u8>) -> Result<ClassificationReport> {
        if x.nrows() != y.len() {
            return Err(RetentionError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        let predictions = self.predict(x)?;
        Ok(ClassificationReport::compute(y, &predictions))
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get the fitted trees
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<u8>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..60 {
            let v = i as f64;
            rows.extend_from_slice(&[v, (i % 7) as f64, 1.0]);
            labels.push(u8::from(i >= 30));
        }
        (Array2::from_shape_vec((60, 3), rows).unwrap(), Array1::from_vec(labels))
    }

    #[test]
    fn test_random_forest_classifier() {
        let (x, y) = separable();
        let mut rf = RandomForest::new(15).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();
        let correct = predictions.iter().zip(y.iter()).filter(|(a, b)| a == b).count();
        assert!(correct >= 57);
    }

    #[test]
    fn test_fit_is_reproducible() {
        let (x, y) = separable();
        let mut a = RandomForest::new(10).with_random_state(7);
        let mut b = RandomForest::new(10).with_random_state(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_probability_is_vote_fraction() {
        let (x, y) = separable();
        let mut rf = RandomForest::new(8).with_random_state(1);
        rf.fit(&x, &y).unwrap();

        let p = rf.predict_proba_row(x.row(0)).unwrap();
        assert!((p * 8.0 - (p * 8.0).round()).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_threshold_applies_at_boundary() {
        let (x, y) = separable();
        let mut rf = RandomForest::new(4).with_random_state(3);
        rf.fit(&x, &y).unwrap();

        for row in x.outer_iter() {
            let (label, p) = rf.predict_row(row).unwrap();
            assert_eq!(label == 1, p >= DECISION_THRESHOLD);
        }
    }

    #[test]
    fn test_feature_importances_normalized() {
        let (x, y) = separable();
        let mut rf = RandomForest::new(10);
        rf.fit(&x, &y).unwrap();

        let importances = rf.feature_importances().unwrap();
        assert!((importances.sum() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[2]);
    }

    #[test]
    fn test_rejects_bad_labels() {
        let x = array![[1.0], [2.0]];
        let y = array![0u8, 2];
        assert!(matches!(
            RandomForest::new(3).fit(&x, &y),
            Err(RetentionError::TrainingError(_))
        ));
    }

    #[test]
    fn test_rejects_zero_trees() {
        let (x, y) = separable();
        assert!(matches!(
            RandomForest::new(0).fit(&x, &y),
            Err(RetentionError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![0u8, 1];
        assert!(matches!(
            RandomForest::new(3).fit(&x, &y),
            Err(RetentionError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_input() {
        let x = Array2::<f64>::zeros((0, 3));
        let y = Array1::<u8>::zeros(0);
        assert!(RandomForest::new(3).fit(&x, &y).is_err());
    }

    #[test]
    fn test_width_mismatch_is_inference_error() {
        let (x, y) = separable();
        let mut rf = RandomForest::new(3);
        rf.fit(&x, &y).unwrap();
        assert_eq!(
            rf.predict_row(array![1.0, 2.0].view()).unwrap_err(),
            InferenceError::FeatureCount { expected: 3, actual: 2 }
        );
    }

    #[test]
    fn test_unbounded_depth_on_worker_threads() {
        let n = 8_000;
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(n, |i| (i % 2) as u8);

        let mut forest = RandomForest::new(2).with_bootstrap(false);
        forest.fit(&x, &y).unwrap();

        assert!(forest.trees().iter().all(|t| t.get_depth() > 1_000));
        assert_eq!(forest.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_unfitted_forest() {
        let rf = RandomForest::new(3);
        assert_eq!(
            rf.predict_row(array![1.0].view()).unwrap_err(),
            InferenceError::NotFitted
        );
    }
}
