//! Offline pipeline configuration

use crate::preprocessing::ColumnRoles;
use crate::training::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Paths and settings for the preprocess / train steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Historical CSV with the `Exited` label
    pub data_path: PathBuf,
    /// Directory for the artifact pair
    pub models_dir: PathBuf,
    /// Directory for the processed split
    pub processed_dir: PathBuf,
    /// Column roles for the feature transformer
    pub roles: ColumnRoles,
    /// Split and forest settings
    pub training: TrainingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: std::env::var("DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/churn_data.csv")),
            models_dir: std::env::var("MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models")),
            processed_dir: std::env::var("PROCESSED_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/processed")),
            roles: ColumnRoles::customer(),
            training: TrainingConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set data path
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    /// Set models directory
    pub fn with_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = dir.into();
        self
    }

    /// Set processed split directory
    pub fn with_processed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.processed_dir = dir.into();
        self
    }

    pub fn with_roles(mut self, roles: ColumnRoles) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }
}
