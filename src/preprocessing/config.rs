//! Column role configuration

use crate::error::TransformError;
use crate::schema::CUSTOMER_COLUMNS;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which schema columns are scaled, which are one-hot encoded.
///
/// Every schema column not listed as numeric or categorical is passed
/// through unchanged, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRoles {
    /// All model input columns in declared order
    pub columns: Vec<String>,
    /// Columns standardized with training-set moments
    pub numeric: Vec<String>,
    /// Columns one-hot encoded with the first category dropped
    pub categorical: Vec<String>,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self::customer()
    }
}

impl ColumnRoles {
    /// Create roles over the given schema with no numeric or categorical columns
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            numeric: Vec::new(),
            categorical: Vec::new(),
        }
    }

    /// Roles for the bank customer schema
    pub fn customer() -> Self {
        Self::new(CUSTOMER_COLUMNS)
            .with_numeric([
                "CreditScore",
                "Age",
                "Tenure",
                "Balance",
                "NumOfProducts",
                "EstimatedSalary",
            ])
            .with_categorical(["Geography", "Gender"])
    }

    /// Builder method to set numeric columns
    pub fn with_numeric<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.numeric = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set categorical columns
    pub fn with_categorical<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.categorical = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Columns forwarded unchanged
    pub fn passthrough(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !self.numeric.contains(c) && !self.categorical.contains(c))
            .cloned()
            .collect()
    }

    /// Check that every role refers to a schema column and no column has two roles
    pub fn validate(&self) -> Result<(), TransformError> {
        let schema: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();

        for column in self.numeric.iter().chain(self.categorical.iter()) {
            if !schema.contains(column.as_str()) {
                return Err(TransformError::UnknownColumn(column.clone()));
            }
            if !seen.insert(column.as_str()) {
                return Err(TransformError::DuplicateRole(column.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_roles() {
        let roles = ColumnRoles::customer();
        assert!(roles.validate().is_ok());
        assert_eq!(roles.numeric.len(), 6);
        assert_eq!(roles.categorical, vec!["Geography", "Gender"]);
        assert_eq!(roles.passthrough(), vec!["HasCrCard", "IsActiveMember"]);
    }

    #[test]
    fn test_unknown_column_rejected() {
        let roles = ColumnRoles::new(["a", "b"]).with_numeric(["c"]);
        assert_eq!(
            roles.validate(),
            Err(TransformError::UnknownColumn("c".to_string()))
        );
    }

    #[test]
    fn test_duplicate_role_rejected() {
        let roles = ColumnRoles::new(["a", "b"])
            .with_numeric(["a"])
            .with_categorical(["a"]);
        assert_eq!(
            roles.validate(),
            Err(TransformError::DuplicateRole("a".to_string()))
        );
    }
}
