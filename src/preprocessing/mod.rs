//! Feature preprocessing module
//!
//! Fits per-column encodings on a training partition and applies them
//! deterministically to any later record:
//! - Standard scaling of numeric columns (population moments)
//! - One-hot encoding of categorical columns, first category dropped
//! - Passthrough of every other schema column

mod config;
mod encoder;
mod pipeline;
mod scaler;

pub use config::ColumnRoles;
pub use encoder::OneHotEncoder;
pub use pipeline::FeatureTransformer;
pub use scaler::StandardScaler;
