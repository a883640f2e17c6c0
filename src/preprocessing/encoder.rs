//! One-hot encoding with the first category dropped

use crate::error::TransformError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fitted one-hot encoder for one categorical column.
///
/// Categories are kept sorted. The first one is the reference category:
/// it is encoded as all zeros and has no indicator column of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    column: String,
    categories: Vec<String>,
}

impl OneHotEncoder {
    /// Fit on the observed values of a column.
    pub fn fit<'a>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, TransformError> {
        let column = column.into();
        let categories: Vec<String> = values
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        match categories.len() {
            0 => Err(TransformError::EmptyTable),
            1 => Err(TransformError::SingleCategory {
                column,
                value: categories[0].clone(),
            }),
            _ => Ok(Self { column, categories }),
        }
    }

    /// Number of indicator columns produced.
    pub fn width(&self) -> usize {
        self.categories.len() - 1
    }

    /// Append the indicator block for `value` to `out`.
    pub fn encode_into(&self, value: &str, out: &mut Vec<f64>) -> Result<(), TransformError> {
        let position = self
            .categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .map_err(|_| TransformError::UnseenCategory {
                column: self.column.clone(),
                value: value.to_string(),
            })?;

        let start = out.len();
        out.resize(start + self.width(), 0.0);
        if position > 0 {
            out[start + position - 1] = 1.0;
        }
        Ok(())
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// All fitted categories, sorted, reference first.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// The dropped category.
    pub fn reference(&self) -> &str {
        &self.categories[0]
    }

    /// Categories that get an indicator column, in output order.
    pub fn encoded_categories(&self) -> &[String] {
        &self.categories[1..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> OneHotEncoder {
        OneHotEncoder::fit("letter", ["C", "A", "B", "A", "C"]).unwrap()
    }

    #[test]
    fn test_categories_sorted_reference_first() {
        let encoder = fitted();
        assert_eq!(encoder.categories(), &["A", "B", "C"]);
        assert_eq!(encoder.reference(), "A");
        assert_eq!(encoder.encoded_categories(), &["B", "C"]);
        assert_eq!(encoder.width(), 2);
    }

    #[test]
    fn test_encode_one_hot() {
        let encoder = fitted();

        let mut out = Vec::new();
        encoder.encode_into("B", &mut out).unwrap();
        assert_eq!(out, vec![1.0, 0.0]);

        out.clear();
        encoder.encode_into("C", &mut out).unwrap();
        assert_eq!(out, vec![0.0, 1.0]);

        out.clear();
        encoder.encode_into("A", &mut out).unwrap();
        assert_eq!(out, vec![0.0, 0.0]);
    }

    #[test]
    fn test_encode_appends() {
        let encoder = fitted();
        let mut out = vec![7.0];
        encoder.encode_into("C", &mut out).unwrap();
        assert_eq!(out, vec![7.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unseen_category() {
        let encoder = fitted();
        let mut out = Vec::new();
        let err = encoder.encode_into("D", &mut out).unwrap_err();
        assert_eq!(
            err,
            TransformError::UnseenCategory {
                column: "letter".to_string(),
                value: "D".to_string(),
            }
        );
    }

    #[test]
    fn test_single_category_rejected() {
        let err = OneHotEncoder::fit("g", ["x", "x"]).unwrap_err();
        assert!(matches!(err, TransformError::SingleCategory { .. }));
    }
}
