//! Online inference
//!
//! Applies the loaded transformer (never refit) and classifier to incoming
//! records.

mod engine;

pub use engine::{ChurnService, PredictionResult, CHURN, NO_CHURN};
