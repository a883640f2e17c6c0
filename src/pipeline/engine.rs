//! Offline phase: split, fit transformer, fit classifier, evaluate, save

use super::config::PipelineConfig;
use super::processed::ProcessedSplit;
use crate::artifacts::{ArtifactStore, ModelArtifacts};
use crate::data::{DataLoader, LabeledDataset};
use crate::error::{RetentionError, Result};
use crate::preprocessing::FeatureTransformer;
use crate::training::{stratified_split, ClassificationReport, RandomForest};
use ndarray::Array1;
use serde::Serialize;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Everything a completed training run produced.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifacts: ModelArtifacts,
    pub report: ClassificationReport,
    pub n_train: usize,
    pub n_test: usize,
    pub training_time_secs: f64,
}

impl TrainingOutcome {
    /// Features ranked by importance, highest first.
    pub fn ranked_importances(&self) -> Vec<(String, f64)> {
        let names = self.artifacts.transformer.feature_names();
        let mut ranked: Vec<(String, f64)> = match self.artifacts.classifier.feature_importances() {
            Some(imp) => names.into_iter().zip(imp.iter().copied()).collect(),
            None => Vec::new(),
        };
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// Summary of the preprocess step
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessSummary {
    pub run_id: String,
    pub n_train: usize,
    pub n_test: usize,
    pub n_features: usize,
    pub feature_names: Vec<String>,
}

impl From<&ProcessedSplit> for PreprocessSummary {
    fn from(split: &ProcessedSplit) -> Self {
        Self {
            run_id: split.run_id.clone(),
            n_train: split.x_train.nrows(),
            n_test: split.x_test.nrows(),
            n_features: split.n_features(),
            feature_names: split.feature_names.clone(),
        }
    }
}

/// Runs the offline phase
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    config: PipelineConfig,
}

impl TrainingPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Split the dataset, fit the transformer on the training rows only and
    /// transform both partitions. A fresh run id is minted here.
    pub fn preprocess(&self, dataset: &LabeledDataset) -> Result<(FeatureTransformer, ProcessedSplit)> {
        let training = &self.config.training;
        training.validate()?;

        let split = stratified_split(&dataset.labels, training.test_size, training.random_seed)?;
        let train = dataset.select(&split.train);
        let test = dataset.select(&split.test);

        let (transformer, x_train) = FeatureTransformer::fit_transform(self.config.roles.clone(), &train.records)?;
        let x_test = transformer.transform_batch(&test.records)?;

        let run_id = Uuid::new_v4().to_string();
        info!(
            run_id = %run_id,
            n_train = train.len(),
            n_test = test.len(),
            n_features = transformer.n_features(),
            "Preprocessed dataset"
        );

        let processed = ProcessedSplit {
            run_id,
            feature_names: transformer.feature_names(),
            x_train,
            y_train: Array1::from_vec(train.labels),
            x_test,
            y_test: Array1::from_vec(test.labels),
        };
        Ok((transformer, processed))
    }

    /// Fit the forest on the training partition and score it on the test one.
    pub fn train(&self, split: &ProcessedSplit) -> Result<(RandomForest, ClassificationReport)> {
        let training = &self.config.training;
        training.validate()?;

        let mut forest = training.build_forest();
        forest.fit(&split.x_train, &split.y_train)?;

        let report = if split.x_test.nrows() > 0 {
            forest.evaluate(&split.x_test, &split.y_test)?
        } else {
            ClassificationReport::compute(&split.y_test, &split.y_test)
        };

        info!(
            run_id = %split.run_id,
            n_trees = forest.trees().len(),
            accuracy = report.accuracy,
            "Trained classifier"
        );
        Ok((forest, report))
    }

    /// Both steps in memory, no persistence.
    pub fn fit(&self, dataset: &LabeledDataset) -> Result<TrainingOutcome> {
        let start = Instant::now();
        let (transformer, split) = self.preprocess(dataset)?;
        let (classifier, report) = self.train(&split)?;

        Ok(TrainingOutcome {
            artifacts: ModelArtifacts::new(split.run_id.clone(), transformer, classifier),
            report,
            n_train: split.x_train.nrows(),
            n_test: split.x_test.nrows(),
            training_time_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Load the CSV, preprocess, and persist the transformer and the split.
    pub fn run_preprocess(&self) -> Result<PreprocessSummary> {
        let dataset = DataLoader::new().load_labeled(&self.config.data_path)?;
        let (transformer, split) = self.preprocess(&dataset)?;

        ArtifactStore::new(&self.config.models_dir).save_transformer(&split.run_id, &transformer)?;
        split.save(&self.config.processed_dir)?;

        info!(
            models_dir = %self.config.models_dir.display(),
            processed_dir = %self.config.processed_dir.display(),
            "Saved transformer and processed split"
        );
        Ok(PreprocessSummary::from(&split))
    }

    /// Load the persisted split, train, and persist the classifier next to
    /// the transformer of the same run.
    pub fn run_train(&self) -> Result<TrainingOutcome> {
        let start = Instant::now();
        let split = ProcessedSplit::load(&self.config.processed_dir)?;

        let store = ArtifactStore::new(&self.config.models_dir);
        let (transformer, meta) = store.load_transformer()?;
        if meta.run_id != split.run_id {
            return Err(RetentionError::DataError(format!(
                "processed split belongs to run {} but the saved transformer to run {}; rerun preprocess",
                split.run_id, meta.run_id
            )));
        }

        let (classifier, report) = self.train(&split)?;
        let artifacts = ModelArtifacts::new(split.run_id.clone(), transformer, classifier);
        store.save(&artifacts)?;

        Ok(TrainingOutcome {
            artifacts,
            report,
            n_train: split.x_train.nrows(),
            n_test: split.x_test.nrows(),
            training_time_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Load, fit and save the pair in one go.
    pub fn run_fit(&self) -> Result<TrainingOutcome> {
        let dataset = DataLoader::new().load_labeled(&self.config.data_path)?;
        let outcome = self.fit(&dataset)?;
        ArtifactStore::new(&self.config.models_dir).save(&outcome.artifacts)?;
        Ok(outcome)
    }
}
