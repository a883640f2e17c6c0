//! The fitted transformer and classifier, persisted as a pair

use super::envelope::{ArtifactEnvelope, ArtifactKind, ArtifactMetadata};
use crate::error::{ArtifactLoadError, RetentionError, Result};
use crate::preprocessing::FeatureTransformer;
use crate::training::RandomForest;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the fitted transformer
pub const TRANSFORMER_FILE: &str = "preprocessor.bin";
/// File name of the fitted classifier
pub const CLASSIFIER_FILE: &str = "churn_model.bin";

/// Transformer and classifier from one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifacts {
    pub run_id: String,
    pub transformer: FeatureTransformer,
    pub classifier: RandomForest,
    /// When the classifier was written; `None` before the first save
    pub created_at: Option<DateTime<Utc>>,
}

impl ModelArtifacts {
    pub fn new(run_id: impl Into<String>, transformer: FeatureTransformer, classifier: RandomForest) -> Self {
        Self {
            run_id: run_id.into(),
            transformer,
            classifier,
            created_at: None,
        }
    }

    /// Reject a pair whose feature widths disagree.
    pub fn check_compatible(&self) -> std::result::Result<(), ArtifactLoadError> {
        let transformer = self.transformer.n_features();
        let classifier = self.classifier.n_features();
        if transformer != classifier {
            return Err(ArtifactLoadError::FeatureMismatch {
                transformer,
                classifier,
            });
        }
        Ok(())
    }
}

/// Directory holding one artifact pair
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn transformer_path(&self) -> PathBuf {
        self.dir.join(TRANSFORMER_FILE)
    }

    pub fn classifier_path(&self) -> PathBuf {
        self.dir.join(CLASSIFIER_FILE)
    }

    /// Whether both files of the pair exist.
    pub fn exists(&self) -> bool {
        self.transformer_path().is_file() && self.classifier_path().is_file()
    }

    /// Persist both artifacts under one run id.
    pub fn save(&self, artifacts: &ModelArtifacts) -> Result<()> {
        artifacts.check_compatible()?;
        if !artifacts.classifier.is_fitted() {
            return Err(RetentionError::TrainingError(
                "refusing to save an unfitted classifier".to_string(),
            ));
        }

        self.save_transformer(&artifacts.run_id, &artifacts.transformer)?;
        self.save_classifier(
            &artifacts.run_id,
            artifacts.transformer.feature_names(),
            &artifacts.classifier,
        )?;

        info!(
            dir = %self.dir.display(),
            run_id = %artifacts.run_id,
            n_features = artifacts.transformer.n_features(),
            "Saved model artifacts"
        );
        Ok(())
    }

    /// Load and cross-check the pair.
    pub fn load(&self) -> std::result::Result<ModelArtifacts, ArtifactLoadError> {
        let (transformer, t_meta) = self.load_transformer()?;
        let (classifier, c_meta) = self.load_classifier()?;

        if t_meta.run_id != c_meta.run_id {
            return Err(ArtifactLoadError::RunMismatch {
                transformer: t_meta.run_id,
                classifier: c_meta.run_id,
            });
        }
        if !classifier.is_fitted() {
            return Err(ArtifactLoadError::Corrupt {
                path: self.classifier_path(),
                reason: "classifier holds no trees".to_string(),
            });
        }

        let artifacts = ModelArtifacts {
            run_id: t_meta.run_id,
            transformer,
            classifier,
            created_at: Some(c_meta.created_at),
        };
        artifacts.check_compatible()?;

        info!(
            dir = %self.dir.display(),
            run_id = %artifacts.run_id,
            n_features = artifacts.transformer.n_features(),
            n_trees = artifacts.classifier.trees().len(),
            "Loaded model artifacts"
        );
        Ok(artifacts)
    }

    pub fn save_transformer(&self, run_id: &str, transformer: &FeatureTransformer) -> Result<()> {
        self.write(
            TRANSFORMER_FILE,
            ArtifactKind::Transformer,
            run_id,
            transformer.feature_names(),
            transformer,
        )
    }

    pub fn load_transformer(
        &self,
    ) -> std::result::Result<(FeatureTransformer, ArtifactMetadata), ArtifactLoadError> {
        self.read(TRANSFORMER_FILE, ArtifactKind::Transformer)
    }

    pub fn save_classifier(
        &self,
        run_id: &str,
        feature_names: Vec<String>,
        classifier: &RandomForest,
    ) -> Result<()> {
        self.write(
            CLASSIFIER_FILE,
            ArtifactKind::Classifier,
            run_id,
            feature_names,
            classifier,
        )
    }

    pub fn load_classifier(&self) -> std::result::Result<(RandomForest, ArtifactMetadata), ArtifactLoadError> {
        self.read(CLASSIFIER_FILE, ArtifactKind::Classifier)
    }

    /// Seal `value` into `<dir>/<file>`.
    pub fn write<T: Serialize>(
        &self,
        file: &str,
        kind: ArtifactKind,
        run_id: &str,
        feature_names: Vec<String>,
        value: &T,
    ) -> Result<()> {
        let metadata = ArtifactMetadata::new(kind, run_id, feature_names);
        ArtifactEnvelope::seal(metadata, value)?.write(&self.dir.join(file))
    }

    /// Open `<dir>/<file>` as an artifact of `kind`.
    pub fn read<T: DeserializeOwned>(
        &self,
        file: &str,
        kind: ArtifactKind,
    ) -> std::result::Result<(T, ArtifactMetadata), ArtifactLoadError> {
        let path = self.dir.join(file);
        let envelope = ArtifactEnvelope::read(&path, kind)?;
        let value = envelope.open(&path)?;
        Ok((value, envelope.metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::ColumnRoles;
    use crate::schema::CustomerRecord;
    use ndarray::Array1;
    use tempfile::TempDir;

    fn record(i: i64) -> CustomerRecord {
        CustomerRecord {
            credit_score: 500 + i * 7,
            geography: ["France", "Germany", "Spain"][(i % 3) as usize].to_string(),
            gender: if i % 2 == 0 { "Female" } else { "Male" }.to_string(),
            age: 20 + i,
            tenure: i % 10,
            balance: (i * 1000) as f64,
            num_of_products: 1 + i % 4,
            has_cr_card: (i % 2) as u8,
            is_active_member: ((i / 2) % 2) as u8,
            estimated_salary: 30000.0 + (i * 517) as f64,
        }
    }

    fn fitted_pair(run_id: &str) -> ModelArtifacts {
        let table: Vec<CustomerRecord> = (0..40).map(record).collect();
        let labels = Array1::from_iter((0..40).map(|i| u8::from(i >= 25)));
        let (transformer, x) = FeatureTransformer::fit_transform(ColumnRoles::customer(), &table).unwrap();
        let mut classifier = RandomForest::new(5);
        classifier.fit(&x, &labels).unwrap();
        ModelArtifacts::new(run_id, transformer, classifier)
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let pair = fitted_pair("run-a");

        store.save(&pair).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.run_id, "run-a");
        assert_eq!(loaded.transformer, pair.transformer);
        assert_eq!(loaded.classifier, pair.classifier);
        assert!(loaded.created_at.is_some());
    }

    #[test]
    fn test_missing_classifier() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let pair = fitted_pair("run-a");
        store.save_transformer("run-a", &pair.transformer).unwrap();

        assert!(matches!(store.load(), Err(ArtifactLoadError::Missing(p)) if p.ends_with(CLASSIFIER_FILE)));
    }

    #[test]
    fn test_run_mismatch() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let pair = fitted_pair("run-a");
        store.save_transformer("run-a", &pair.transformer).unwrap();
        store
            .save_classifier("run-b", pair.transformer.feature_names(), &pair.classifier)
            .unwrap();

        assert!(matches!(store.load(), Err(ArtifactLoadError::RunMismatch { .. })));
    }

    #[test]
    fn test_save_rejects_width_mismatch() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let mut pair = fitted_pair("run-a");
        let x = ndarray::Array2::<f64>::zeros((4, 3));
        pair.classifier = RandomForest::new(2);
        pair.classifier.fit(&x, &Array1::from_vec(vec![0, 1, 0, 1])).unwrap();

        assert!(matches!(
            store.save(&pair),
            Err(RetentionError::ArtifactLoad(ArtifactLoadError::FeatureMismatch { .. }))
        ));
    }
}
