//! Column transformer: scaling, one-hot encoding and passthrough
//!
//! Output layout is fixed at fit time:
//! numeric block (declared order) → one-hot block (declared column order,
//! then sorted category order minus the reference) → passthrough block
//! (schema order). Batch transformation goes through the single-record
//! path, so a record transformed alone and inside a table yields the same
//! bits.

use crate::error::TransformError;
use crate::schema::{FieldValue, Record};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ColumnRoles, OneHotEncoder, StandardScaler};

/// A fitted feature transformer. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTransformer {
    roles: ColumnRoles,
    scalers: Vec<StandardScaler>,
    encoders: Vec<OneHotEncoder>,
    passthrough: Vec<String>,
}

impl FeatureTransformer {
    /// Fit scalers and encoders on the training partition.
    pub fn fit<R: Record + Sync>(roles: ColumnRoles, table: &[R]) -> Result<Self, TransformError> {
        roles.validate()?;
        if table.is_empty() {
            return Err(TransformError::EmptyTable);
        }

        // Columns fit independently; collection keeps declared order
        let scalers = roles
            .numeric
            .par_iter()
            .map(|column| {
                let values = table
                    .iter()
                    .map(|record| numeric_value(record, column))
                    .collect::<Result<Vec<f64>, _>>()?;
                StandardScaler::fit(column.as_str(), &values)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let encoders = roles
            .categorical
            .par_iter()
            .map(|column| {
                let values = table
                    .iter()
                    .map(|record| text_value(record, column))
                    .collect::<Result<Vec<&str>, _>>()?;
                OneHotEncoder::fit(column.as_str(), values)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let passthrough = roles.passthrough();

        let transformer = Self {
            roles,
            scalers,
            encoders,
            passthrough,
        };
        debug!(
            rows = table.len(),
            n_features = transformer.n_features(),
            "Fitted feature transformer"
        );
        Ok(transformer)
    }

    /// Fit on `table` and transform it in one step.
    pub fn fit_transform<R: Record + Sync>(
        roles: ColumnRoles,
        table: &[R],
    ) -> Result<(Self, Array2<f64>), TransformError> {
        let transformer = Self::fit(roles, table)?;
        let features = transformer.transform_batch(table)?;
        Ok((transformer, features))
    }

    /// Transform one record into a feature vector.
    pub fn transform<R: Record>(&self, record: &R) -> Result<Array1<f64>, TransformError> {
        let mut out = Vec::with_capacity(self.n_features());

        for scaler in &self.scalers {
            let value = numeric_value(record, scaler.column())?;
            out.push(scaler.scale(value)?);
        }

        for encoder in &self.encoders {
            let value = text_value(record, encoder.column())?;
            encoder.encode_into(value, &mut out)?;
        }

        for column in &self.passthrough {
            let value = numeric_value(record, column)?;
            if !value.is_finite() {
                return Err(TransformError::NonFiniteValue {
                    column: column.clone(),
                });
            }
            out.push(value);
        }

        Ok(Array1::from_vec(out))
    }

    /// Transform a table, one row per record, rows in input order.
    pub fn transform_batch<R: Record + Sync>(&self, table: &[R]) -> Result<Array2<f64>, TransformError> {
        let rows: Vec<Array1<f64>> = table
            .par_iter()
            .enumerate()
            .map(|(row, record)| {
                self.transform(record).map_err(|e| TransformError::AtRow {
                    row,
                    source: Box::new(e),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let width = self.n_features();
        let mut features = Array2::zeros((rows.len(), width));
        for (mut target, row) in features.outer_iter_mut().zip(rows.iter()) {
            target.assign(row);
        }
        Ok(features)
    }

    /// Width of every transformed vector.
    pub fn n_features(&self) -> usize {
        self.scalers.len()
            + self.encoders.iter().map(OneHotEncoder::width).sum::<usize>()
            + self.passthrough.len()
    }

    /// Output column names in output order.
    pub fn feature_names(&self) -> Vec<String> {
        let numeric = self.scalers.iter().map(|s| format!("num__{}", s.column()));
        let categorical = self.encoders.iter().flat_map(|e| {
            e.encoded_categories()
                .iter()
                .map(move |category| format!("cat__{}_{}", e.column(), category))
        });
        let passthrough = self.passthrough.iter().map(|c| format!("remainder__{}", c));

        numeric.chain(categorical).chain(passthrough).collect()
    }

    pub fn roles(&self) -> &ColumnRoles {
        &self.roles
    }

    pub fn scalers(&self) -> &[StandardScaler] {
        &self.scalers
    }

    pub fn encoders(&self) -> &[OneHotEncoder] {
        &self.encoders
    }

    pub fn passthrough(&self) -> &[String] {
        &self.passthrough
    }
}

fn numeric_value<R: Record + ?Sized>(record: &R, column: &str) -> Result<f64, TransformError> {
    match record.field(column) {
        Some(FieldValue::Number(v)) => Ok(v),
        Some(FieldValue::Text(_)) => Err(TransformError::WrongKind {
            column: column.to_string(),
            expected: "numeric",
        }),
        None => Err(TransformError::MissingValue(column.to_string())),
    }
}

fn text_value<'r, R: Record + ?Sized>(record: &'r R, column: &str) -> Result<&'r str, TransformError> {
    match record.field(column) {
        Some(FieldValue::Text(v)) => Ok(v),
        Some(FieldValue::Number(_)) => Err(TransformError::WrongKind {
            column: column.to_string(),
            expected: "text",
        }),
        None => Err(TransformError::MissingValue(column.to_string())),
    }
}
