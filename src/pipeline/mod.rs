//! Training pipeline
//!
//! load → stratified split → fit transformer (train rows only) → transform
//! both partitions → fit forest → evaluate → save. Runs either as two
//! persisted steps (`preprocess`, `train`) or as one (`fit`).

mod config;
mod engine;
mod processed;

pub use config::PipelineConfig;
pub use engine::{PreprocessSummary, TrainingOutcome, TrainingPipeline};
pub use processed::{ProcessedSplit, SPLIT_FILE};
