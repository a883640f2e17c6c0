//! Error types for the retention engine
//!
//! Each stage of the pipeline has its own error kind so callers can tell a
//! malformed request apart from a broken artifact without matching on
//! message strings.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for retention engine operations
pub type Result<T> = std::result::Result<T, RetentionError>;

/// A raw record failed presence or type checks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("field {field} must be {expected}, got {actual}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        actual: String,
    },

    #[error("field {field} is out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

/// Fitting or applying the feature transformer failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("cannot fit on an empty table")]
    EmptyTable,

    #[error("column {0} is not part of the schema")]
    UnknownColumn(String),

    #[error("column {0} is assigned more than one role")]
    DuplicateRole(String),

    #[error("numeric column {0} has no finite values")]
    NoFiniteValues(String),

    #[error("categorical column {column} has a single category ({value}); drop-first encoding needs at least 2")]
    SingleCategory { column: String, value: String },

    #[error("column {column} has unseen category '{value}'")]
    UnseenCategory { column: String, value: String },

    #[error("column {column} holds a non-finite value")]
    NonFiniteValue { column: String },

    #[error("column {column} expected {expected} values")]
    WrongKind {
        column: String,
        expected: &'static str,
    },

    #[error("record is missing column {0}")]
    MissingValue(String),

    #[error("row {row}: {source}")]
    AtRow {
        row: usize,
        source: Box<TransformError>,
    },
}

/// A persisted artifact could not be loaded. Fatal at startup.
#[derive(Error, Debug)]
pub enum ArtifactLoadError {
    #[error("artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("artifact {} holds a {found} but a {expected} was expected", path.display())]
    WrongKind {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("artifacts come from different training runs (transformer {transformer}, classifier {classifier})")]
    RunMismatch {
        transformer: String,
        classifier: String,
    },

    #[error("transformer produces {transformer} features but the classifier expects {classifier}")]
    FeatureMismatch { transformer: usize, classifier: usize },
}

/// The classifier call failed on a transformed vector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("model not fitted")]
    NotFitted,

    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("scoring task did not complete: {0}")]
    Interrupted(String),
}

/// Why a single prediction request failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl PredictError {
    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::Validation(_) => "validation",
            PredictError::Transform(_) => "transform",
            PredictError::Inference(_) => "inference",
        }
    }
}

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum RetentionError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Artifact load error: {0}")]
    ArtifactLoad(#[from] ArtifactLoadError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for RetentionError {
    fn from(err: polars::error::PolarsError) -> Self {
        RetentionError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for RetentionError {
    fn from(err: serde_json::Error) -> Self {
        RetentionError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for RetentionError {
    fn from(err: bincode::Error) -> Self {
        RetentionError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for RetentionError {
    fn from(err: ndarray::ShapeError) -> Self {
        RetentionError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
