//! Transformed train/test partitions handed from `preprocess` to `train`

use crate::artifacts::{ArtifactKind, ArtifactStore};
use crate::error::{ArtifactLoadError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the processed split
pub const SPLIT_FILE: &str = "processed_split.bin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedSplit {
    /// Run id of the transformer that produced the matrices
    pub run_id: String,
    pub feature_names: Vec<String>,
    pub x_train: Array2<f64>,
    pub y_train: Array1<u8>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<u8>,
}

impl ProcessedSplit {
    pub fn n_features(&self) -> usize {
        self.x_train.ncols()
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        ArtifactStore::new(dir).write(
            SPLIT_FILE,
            ArtifactKind::ProcessedSplit,
            &self.run_id,
            self.feature_names.clone(),
            self,
        )
    }

    pub fn load(dir: &Path) -> std::result::Result<Self, ArtifactLoadError> {
        let (split, _): (Self, _) = ArtifactStore::new(dir).read(SPLIT_FILE, ArtifactKind::ProcessedSplit)?;
        Ok(split)
    }
}
