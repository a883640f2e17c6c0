//! Training configuration

use crate::error::{RetentionError, Result};
use serde::{Deserialize, Serialize};

use super::random_forest::{MaxFeatures, RandomForest};

/// Configuration for the split and the forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,

    /// Seed for the split and the first tree
    pub random_seed: u64,

    /// Number of trees
    pub n_estimators: usize,

    /// Maximum depth of trees
    pub max_depth: Option<usize>,

    /// Minimum samples to split a node
    pub min_samples_split: usize,

    /// Minimum samples per leaf
    pub min_samples_leaf: usize,

    /// Features examined per split
    pub max_features: MaxFeatures,

    /// Draw a bootstrap sample per tree
    pub bootstrap: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_seed: 42,
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set held-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Set random seed
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Set number of trees
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples per leaf
    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n;
        self
    }

    /// Grow every tree on the full training partition when `false`
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(RetentionError::InvalidParameter {
                name: "test_size".to_string(),
                value: self.test_size.to_string(),
                reason: "must lie strictly between 0 and 1".to_string(),
            });
        }
        if self.n_estimators == 0 {
            return Err(RetentionError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: "0".to_string(),
                reason: "a forest needs at least one tree".to_string(),
            });
        }
        if self.min_samples_leaf == 0 {
            return Err(RetentionError::InvalidParameter {
                name: "min_samples_leaf".to_string(),
                value: "0".to_string(),
                reason: "leaves must hold at least one sample".to_string(),
            });
        }
        Ok(())
    }

    /// An unfitted forest carrying these hyperparameters.
    pub fn build_forest(&self) -> RandomForest {
        let mut forest = RandomForest::new(self.n_estimators)
            .with_random_state(self.random_seed)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_features(self.max_features)
            .with_bootstrap(self.bootstrap);
        if let Some(depth) = self.max_depth {
            forest = forest.with_max_depth(depth);
        }
        forest
    }
}
