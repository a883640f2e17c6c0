//! Retention Engine - bank customer churn prediction
//!
//! Fits a feature transformer and a random forest on historical customer
//! records, persists them as one versioned pair, and serves predictions
//! that reuse the exact fitted transformation.
//!
//! # Modules
//!
//! ## Core
//! - [`schema`] - The 10-field customer record and JSON validation
//! - [`preprocessing`] - Standard scaling, one-hot encoding, passthrough
//! - [`training`] - Random forest, stratified split, classification report
//! - [`artifacts`] - Checksummed, versioned artifact pair on disk
//! - [`inference`] - The ready-state churn prediction service
//!
//! ## Offline phase
//! - [`data`] - Historical CSV loading
//! - [`pipeline`] - Preprocess / train / fit orchestration
//!
//! ## Services
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core
pub mod schema;
pub mod preprocessing;
pub mod training;
pub mod artifacts;
pub mod inference;

// Offline phase
pub mod data;
pub mod pipeline;

// Services
pub mod server;
pub mod cli;

pub use error::{RetentionError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{
        ArtifactLoadError, InferenceError, PredictError, RetentionError, Result, TransformError,
        ValidationError,
    };

    // Schema
    pub use crate::schema::{CustomerRecord, Record, CUSTOMER_COLUMNS, TARGET_COLUMN};

    // Preprocessing
    pub use crate::preprocessing::{ColumnRoles, FeatureTransformer};

    // Training
    pub use crate::training::{
        stratified_split, ClassificationReport, RandomForest, TrainingConfig, DECISION_THRESHOLD,
    };

    // Artifacts
    pub use crate::artifacts::{ArtifactStore, ModelArtifacts};

    // Inference
    pub use crate::inference::{ChurnService, PredictionResult};

    // Offline phase
    pub use crate::data::{DataLoader, LabeledDataset};
    pub use crate::pipeline::{PipelineConfig, ProcessedSplit, TrainingOutcome, TrainingPipeline};
}
