//! Classification report for the held-out partition

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class and averaged scores plus the confusion matrix.
///
/// `confusion[t][p]` counts samples of true class `t` predicted as `p`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub classes: [ClassMetrics; 2],
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion: [[usize; 2]; 2],
}

impl ClassificationReport {
    /// Compute the report. Both arrays hold labels in {0, 1}; any label
    /// above 1 counts as 1.
    pub fn compute(y_true: &Array1<u8>, y_pred: &Array1<u8>) -> Self {
        let mut confusion = [[0usize; 2]; 2];
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            confusion[usize::from(t.min(1))][usize::from(p.min(1))] += 1;
        }

        let total: usize = confusion.iter().flatten().sum();
        let correct = confusion[0][0] + confusion[1][1];
        let accuracy = ratio(correct, total);

        let class_metrics = |c: usize| {
            let tp = confusion[c][c];
            let predicted = confusion[0][c] + confusion[1][c];
            let support = confusion[c][0] + confusion[c][1];
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            ClassMetrics {
                precision,
                recall,
                f1_score: f1(precision, recall),
                support,
            }
        };
        let classes = [class_metrics(0), class_metrics(1)];

        let macro_avg = ClassMetrics {
            precision: (classes[0].precision + classes[1].precision) / 2.0,
            recall: (classes[0].recall + classes[1].recall) / 2.0,
            f1_score: (classes[0].f1_score + classes[1].f1_score) / 2.0,
            support: total,
        };

        let weighted = |pick: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                return 0.0;
            }
            classes
                .iter()
                .map(|m| pick(m) * m.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1_score: weighted(|m| m.f1_score),
            support: total,
        };

        Self {
            accuracy,
            classes,
            macro_avg,
            weighted_avg,
            confusion,
        }
    }

    pub fn n_samples(&self) -> usize {
        self.macro_avg.support
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        for (label, m) in self.classes.iter().enumerate() {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                label, m.precision, m.recall, m.f1_score, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>14} {:>9} {:>9} {:>9.2} {:>9}", "accuracy", "", "", self.accuracy, self.n_samples())?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1_score, m.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classification_report() {
        let y_true = array![0u8, 0, 0, 1, 1, 1];
        let y_pred = array![0u8, 0, 1, 1, 1, 0];

        let report = ClassificationReport::compute(&y_true, &y_pred);

        assert!((report.accuracy - 4.0 / 6.0).abs() < 1e-12);
        assert_eq!(report.confusion, [[2, 1], [1, 2]]);
        assert!((report.classes[1].precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.classes[1].recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.classes[0].support, 3);
        assert_eq!(report.n_samples(), 6);
    }

    #[test]
    fn test_weighted_average_uses_support() {
        let y_true = array![0u8, 0, 0, 1];
        let y_pred = array![0u8, 0, 0, 0];

        let report = ClassificationReport::compute(&y_true, &y_pred);

        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].f1_score, 0.0);
        assert!((report.classes[0].precision - 0.75).abs() < 1e-12);
        assert!((report.weighted_avg.precision - 0.75 * 0.75).abs() < 1e-12);
        assert!((report.macro_avg.recall - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        let empty = Array1::<u8>::zeros(0);
        let report = ClassificationReport::compute(&empty, &empty);
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.n_samples(), 0);
    }

    #[test]
    fn test_display_lists_both_classes() {
        let report = ClassificationReport::compute(&array![0u8, 1], &array![0u8, 1]);
        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("weighted avg"));
        assert!(text.contains("1.00"));
    }
}
