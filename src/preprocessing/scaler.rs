//! Standard scaling with training-set moments

use crate::error::TransformError;
use serde::{Deserialize, Serialize};

/// Relative tolerance below which a standard deviation counts as zero.
const DEGENERATE_SCALE_EPS: f64 = 10.0 * f64::EPSILON;

/// Fitted parameters for one numeric column: `(x - mean) / std`.
///
/// A column whose standard deviation is zero is degenerate and always
/// scales to `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    column: String,
    mean: f64,
    std: f64,
}

impl StandardScaler {
    /// Fit mean and population standard deviation over the finite values.
    pub fn fit(column: impl Into<String>, values: &[f64]) -> Result<Self, TransformError> {
        let column = column.into();
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Err(TransformError::NoFiniteValues(column));
        }

        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let mut std = var.sqrt();
        if std <= DEGENERATE_SCALE_EPS * mean.abs().max(1.0) {
            std = 0.0;
        }

        Ok(Self { column, mean, std })
    }

    /// Scale a single value.
    pub fn scale(&self, value: f64) -> Result<f64, TransformError> {
        if !value.is_finite() {
            return Err(TransformError::NonFiniteValue {
                column: self.column.clone(),
            });
        }
        if self.is_degenerate() {
            return Ok(0.0);
        }
        Ok((value - self.mean) / self.std)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std(&self) -> f64 {
        self.std
    }

    pub fn is_degenerate(&self) -> bool {
        self.std == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaler() {
        let scaler = StandardScaler::fit("a", &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((scaler.mean() - 3.0).abs() < 1e-12);
        // population std of 1..=5
        assert!((scaler.std() - 2.0f64.sqrt()).abs() < 1e-12);

        let scaled = scaler.scale(5.0).unwrap();
        assert!((scaled - 2.0 / 2.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(scaler.scale(3.0).unwrap(), 0.0);
    }

    #[test]
    fn test_degenerate_column_collapses_to_zero() {
        let scaler = StandardScaler::fit("flat", &[0.1, 0.1, 0.1]).unwrap();
        assert!(scaler.is_degenerate());
        assert_eq!(scaler.scale(0.1).unwrap(), 0.0);
        assert_eq!(scaler.scale(1000.0).unwrap(), 0.0);
    }

    #[test]
    fn test_non_finite_values_skipped_at_fit() {
        let scaler = StandardScaler::fit("a", &[1.0, f64::NAN, 3.0]).unwrap();
        assert_eq!(scaler.mean(), 2.0);
    }

    #[test]
    fn test_no_finite_values() {
        let err = StandardScaler::fit("a", &[f64::NAN, f64::INFINITY]).unwrap_err();
        assert_eq!(err, TransformError::NoFiniteValues("a".to_string()));
        assert!(StandardScaler::fit("a", &[]).is_err());
    }

    #[test]
    fn test_non_finite_value_rejected_at_apply() {
        let scaler = StandardScaler::fit("a", &[1.0, 2.0]).unwrap();
        assert!(matches!(
            scaler.scale(f64::NAN),
            Err(TransformError::NonFiniteValue { .. })
        ));
    }
}
