//! Evaluation metrics for classification models.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("{truth} true labels but {predicted} predictions")]
    LengthMismatch { truth: usize, predicted: usize },
    #[error("label {label} is outside 0..{n_classes}")]
    LabelOutOfRange { label: usize, n_classes: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Confusion matrix for a `K`-class classifier.
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u64>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    /// Build a matrix from paired truth/prediction labels. Every pair is
    /// counted, so `total()` equals `truth.len()`.
    pub fn from_predictions(
        n_classes: usize,
        truth: &[usize],
        predicted: &[usize],
    ) -> Result<Self, MetricsError> {
        if truth.len() != predicted.len() {
            return Err(MetricsError::LengthMismatch {
                truth: truth.len(),
                predicted: predicted.len(),
            });
        }
        let mut cm = Self::new(n_classes);
        for (&t, &p) in truth.iter().zip(predicted) {
            cm.add(t, p)?;
        }
        Ok(cm)
    }

    pub fn add(&mut self, truth: usize, predicted: usize) -> Result<(), MetricsError> {
        let n_classes = self.n_classes;
        if let Some(label) = [truth, predicted].into_iter().find(|&l| l >= n_classes) {
            return Err(MetricsError::LabelOutOfRange { label, n_classes });
        }
        let idx = truth * n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
        Ok(())
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u64 {
        self.counts[truth * self.n_classes + predicted]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn correct(&self) -> u64 {
        (0..self.n_classes).map(|idx| self.get(idx, idx)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Precision/recall statistics for a single class.
pub struct PerClassStats {
    /// `TP / (TP + FP)`.
    pub precision: f64,
    /// `TP / (TP + FN)`.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Total number of true examples for the class.
    pub support: u64,
}

/// Compute per-class precision, recall and F1 from a confusion matrix.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes;
    let mut stats = Vec::with_capacity(k);
    for class_idx in 0..k {
        let tp = cm.get(class_idx, class_idx) as f64;
        let mut fp = 0f64;
        let mut fn_ = 0f64;
        let mut support = 0u64;
        for j in 0..k {
            let v = cm.get(class_idx, j);
            support = support.saturating_add(v);
            if j != class_idx {
                fn_ += v as f64;
            }
        }
        for i in 0..k {
            if i != class_idx {
                fp += cm.get(i, class_idx) as f64;
            }
        }
        let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
        let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
        stats.push(PerClassStats {
            precision,
            recall,
            f1: f1_score(precision, recall),
            support,
        });
    }
    stats
}

/// Compute overall accuracy from a confusion matrix. Empty matrices score 0.
pub fn accuracy(cm: &ConfusionMatrix) -> f64 {
    let total = cm.total();
    if total == 0 {
        0.0
    } else {
        cm.correct() as f64 / total as f64
    }
}

pub fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageStats {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

/// Per-class breakdown plus macro and support-weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub per_class: Vec<PerClassStats>,
    pub accuracy: f64,
    pub macro_avg: AverageStats,
    pub weighted_avg: AverageStats,
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let per_class = precision_recall_by_class(cm);
        let support = cm.total();
        let k = per_class.len().max(1) as f64;
        let macro_avg = AverageStats {
            precision: per_class.iter().map(|s| s.precision).sum::<f64>() / k,
            recall: per_class.iter().map(|s| s.recall).sum::<f64>() / k,
            f1: per_class.iter().map(|s| s.f1).sum::<f64>() / k,
            support,
        };
        let weighted = |value: fn(&PerClassStats) -> f64| {
            if support == 0 {
                0.0
            } else {
                per_class
                    .iter()
                    .map(|s| value(s) * s.support as f64)
                    .sum::<f64>()
                    / support as f64
            }
        };
        let weighted_avg = AverageStats {
            precision: weighted(|s| s.precision),
            recall: weighted(|s| s.recall),
            f1: weighted(|s| s.f1),
            support,
        };
        Self {
            accuracy: accuracy(cm),
            per_class,
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (idx, stats) in self.per_class.iter().enumerate() {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                idx, stats.precision, stats.recall, stats.f1, stats.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [
            ("macro avg", &self.macro_avg),
            ("weighted avg", &self.weighted_avg),
        ] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> ConfusionMatrix {
        // truth 0: 3 right, 1 wrong; truth 1: 1 wrong, 5 right
        let truth = [0, 0, 0, 0, 1, 1, 1, 1, 1, 1];
        let pred = [0, 0, 0, 1, 0, 1, 1, 1, 1, 1];
        ConfusionMatrix::from_predictions(2, &truth, &pred).unwrap()
    }

    #[test]
    fn accuracy_is_exact_fraction() {
        let cm = sample_matrix();
        assert_eq!(cm.total(), 10);
        assert_eq!(accuracy(&cm), 8.0 / 10.0);
    }

    #[test]
    fn empty_matrix_has_zero_accuracy() {
        assert_eq!(accuracy(&ConfusionMatrix::new(2)), 0.0);
    }

    #[test]
    fn out_of_range_labels_are_rejected() {
        let err = ConfusionMatrix::from_predictions(2, &[0, 2, 1], &[0, 0, 1]).unwrap_err();
        assert_eq!(err, MetricsError::LabelOutOfRange { label: 2, n_classes: 2 });
        let err = ConfusionMatrix::from_predictions(2, &[0, 1], &[0, 5]).unwrap_err();
        assert_eq!(err, MetricsError::LabelOutOfRange { label: 5, n_classes: 2 });
    }

    #[test]
    fn length_mismatch_is_rejected_not_truncated() {
        let err = ConfusionMatrix::from_predictions(2, &[0, 1, 1], &[0, 1]).unwrap_err();
        assert_eq!(err, MetricsError::LengthMismatch { truth: 3, predicted: 2 });
    }

    #[test]
    fn per_class_stats_match_hand_counts() {
        let stats = precision_recall_by_class(&sample_matrix());
        assert_eq!(stats[0].precision, 3.0 / 4.0);
        assert_eq!(stats[0].recall, 3.0 / 4.0);
        assert_eq!(stats[0].support, 4);
        assert_eq!(stats[1].precision, 5.0 / 6.0);
        assert_eq!(stats[1].recall, 5.0 / 6.0);
        assert!((stats[1].f1 - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn report_weights_by_support() {
        let report = ClassificationReport::from_confusion(&sample_matrix());
        let expected = (0.75 * 4.0 + (5.0 / 6.0) * 6.0) / 10.0;
        assert!((report.weighted_avg.recall - expected).abs() < 1e-12);
        assert!((report.macro_avg.recall - (0.75 + 5.0 / 6.0) / 2.0).abs() < 1e-12);
        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("weighted avg"));
    }

    #[test]
    fn f1_of_zero_scores_is_zero() {
        assert_eq!(f1_score(0.0, 0.0), 0.0);
    }
}
