//! Historical customer data loading

use crate::error::{RetentionError, Result};
use crate::schema::{CustomerRecord, CUSTOMER_COLUMNS, IDENTIFIER_COLUMNS, TARGET_COLUMN};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// CSV loader for the historical churn table
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows sampled for schema inference
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
        }
    }

    /// Load a CSV file
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| RetentionError::DataError(format!("{}: {}", path.display(), e)))?;

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| RetentionError::DataError(format!("{}: {}", path.display(), e)))
    }

    /// Load and convert into typed records with labels.
    pub fn load_labeled(&self, path: impl AsRef<Path>) -> Result<LabeledDataset> {
        let path = path.as_ref();
        let df = self.load_csv(path)?;
        let dataset = LabeledDataset::from_dataframe(&df)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            positive_rate = dataset.positive_rate(),
            "Loaded labeled dataset"
        );
        Ok(dataset)
    }
}

/// Typed customer records with their `Exited` labels, row-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    pub records: Vec<CustomerRecord>,
    pub labels: Vec<u8>,
}

impl LabeledDataset {
    pub fn new(records: Vec<CustomerRecord>, labels: Vec<u8>) -> Result<Self> {
        if records.len() != labels.len() {
            return Err(RetentionError::ShapeError {
                expected: format!("{} labels", records.len()),
                actual: format!("{} labels", labels.len()),
            });
        }
        if let Some(bad) = labels.iter().find(|&&l| l > 1) {
            return Err(RetentionError::DataError(format!(
                "{} must be 0 or 1, found {}",
                TARGET_COLUMN, bad
            )));
        }
        Ok(Self { records, labels })
    }

    /// Convert a loaded frame. Identifier columns are ignored; every schema
    /// column and the label must be present without nulls.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let height = df.height();

        let credit_score = integer_column(df, "CreditScore")?;
        let geography = text_column(df, "Geography")?;
        let gender = text_column(df, "Gender")?;
        let age = integer_column(df, "Age")?;
        let tenure = integer_column(df, "Tenure")?;
        let balance = float_column(df, "Balance")?;
        let num_of_products = integer_column(df, "NumOfProducts")?;
        let has_cr_card = flag_column(df, "HasCrCard")?;
        let is_active_member = flag_column(df, "IsActiveMember")?;
        let estimated_salary = float_column(df, "EstimatedSalary")?;
        let labels = flag_column(df, TARGET_COLUMN)?;

        let mut geography = geography.into_iter();
        let mut gender = gender.into_iter();
        let records = (0..height)
            .map(|i| CustomerRecord {
                credit_score: credit_score[i],
                geography: geography.next().unwrap_or_default(),
                gender: gender.next().unwrap_or_default(),
                age: age[i],
                tenure: tenure[i],
                balance: balance[i],
                num_of_products: num_of_products[i],
                has_cr_card: has_cr_card[i],
                is_active_member: is_active_member[i],
                estimated_salary: estimated_salary[i],
            })
            .collect();

        debug!(rows = height, "Converted frame into customer records");
        Self::new(records, labels)
    }

    /// Rows at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            records: indices.iter().map(|&i| self.records[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn n_positive(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }

    /// Share of rows labelled as churned.
    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            0.0
        } else {
            self.n_positive() as f64 / self.labels.len() as f64
        }
    }
}

/// Shape and class balance of a raw frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub n_rows: usize,
    pub n_cols: usize,
    pub columns: Vec<String>,
    /// Identifier columns found in the file, dropped before modeling
    pub identifiers: Vec<String>,
    /// Schema columns the file lacks
    pub missing: Vec<String>,
    /// `(label 0, label 1)` counts, if the label column is usable
    pub class_counts: Option<(usize, usize)>,
}

impl DatasetSummary {
    pub fn from_dataframe(df: &DataFrame) -> Self {
        let columns: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        let has = |name: &str| columns.iter().any(|c| c == name);

        let identifiers = IDENTIFIER_COLUMNS
            .iter()
            .filter(|c| has(c))
            .map(|c| c.to_string())
            .collect();
        let missing = CUSTOMER_COLUMNS
            .iter()
            .filter(|c| !has(c))
            .map(|c| c.to_string())
            .collect();
        let class_counts = flag_column(df, TARGET_COLUMN).ok().map(|labels| {
            let positives = labels.iter().filter(|&&l| l == 1).count();
            (labels.len() - positives, positives)
        });

        Self {
            n_rows: df.height(),
            n_cols: df.width(),
            columns,
            identifiers,
            missing,
            class_counts,
        }
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| RetentionError::DataError(format!("missing column {}", name)))?;
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    let values = series.f64()?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                RetentionError::DataError(format!("null or non-numeric {} at row {}", name, row))
            })
        })
        .collect()
}

fn integer_column(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    float_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            if v.is_finite() && v.fract() == 0.0 {
                Ok(v as i64)
            } else {
                Err(RetentionError::DataError(format!(
                    "{} at row {} is not an integer: {}",
                    name, row, v
                )))
            }
        })
        .collect()
}

fn flag_column(df: &DataFrame, name: &str) -> Result<Vec<u8>> {
    integer_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            0 | 1 => Ok(v as u8),
            _ => Err(RetentionError::DataError(format!(
                "{} at row {} must be 0 or 1, found {}",
                name, row, v
            ))),
        })
        .collect()
}

fn text_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df
        .column(name)
        .map_err(|_| RetentionError::DataError(format!("missing column {}", name)))?;
    let values = column
        .as_materialized_series()
        .str()
        .map_err(|_| RetentionError::DataError(format!("column {} must hold text", name)))?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(str::to_string)
                .ok_or_else(|| RetentionError::DataError(format!("null {} at row {}", name, row)))
        })
        .collect()
}
