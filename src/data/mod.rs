//! Raw data source: the historical customer table

mod loader;

pub use loader::{DataLoader, DatasetSummary, LabeledDataset};
