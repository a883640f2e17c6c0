//! Model training module
//!
//! Random forest of binary Gini trees, the stratified split used to hold out
//! an evaluation partition, and the classification report computed on it.

mod config;
mod metrics;
mod split;
pub mod decision_tree;
pub mod random_forest;

pub use config::TrainingConfig;
pub use decision_tree::{DecisionTree, TreeNode};
pub use metrics::{ClassMetrics, ClassificationReport};
pub use random_forest::{MaxFeatures, RandomForest, DECISION_THRESHOLD};
pub use split::{stratified_split, TrainTestSplit};
