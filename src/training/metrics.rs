//! Classification metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Predicted-vs-actual counts over the sorted union of observed labels.
/// Rows are true labels, columns predicted labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<i64>,
    pub matrix: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mut labels: Vec<i64> = y_true
            .iter()
            .chain(y_pred.iter())
            .map(|v| v.round() as i64)
            .collect();
        labels.sort_unstable();
        labels.dedup();

        let mut matrix = vec![vec![0usize; labels.len()]; labels.len()];
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            let (Ok(i), Ok(j)) = (
                labels.binary_search(&(t.round() as i64)),
                labels.binary_search(&(p.round() as i64)),
            ) else {
                continue;
            };
            matrix[i][j] += 1;
        }

        Self { labels, matrix }
    }

    /// Sum of all cells
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }
}

/// Metrics for classifier evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub confusion_matrix: ConfusionMatrix,
    pub accuracy: f64,
    /// Precision, recall and F1 treat class code 1 as positive
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub n_samples: usize,
}

impl ClassificationMetrics {
    /// Positive class code used for precision, recall and F1
    pub const POSITIVE_CLASS: f64 = 1.0;

    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n_samples = y_true.len();

        let correct = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| (*t - *p).abs() < 0.5)
            .count();
        let accuracy = if n_samples > 0 {
            correct as f64 / n_samples as f64
        } else {
            0.0
        };

        let (tp, fp, fn_) = Self::positive_counts(y_true, y_pred);
        let ratio = |num: usize, den: usize| if den > 0 { num as f64 / den as f64 } else { 0.0 };

        Self {
            confusion_matrix: ConfusionMatrix::compute(y_true, y_pred),
            accuracy,
            precision: ratio(tp, tp + fp),
            recall: ratio(tp, tp + fn_),
            f1_score: ratio(2 * tp, 2 * tp + fp + fn_),
            n_samples,
        }
    }

    fn positive_counts(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> (usize, usize, usize) {
        let is_pos = |v: f64| (v - Self::POSITIVE_CLASS).abs() < 0.5;
        let mut tp = 0;
        let mut fp = 0;
        let mut fn_ = 0;

        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (is_pos(t), is_pos(p)) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }

        (tp, fp, fn_)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_binary_metrics() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];

        let metrics = ClassificationMetrics::compute(&y_true, &y_pred);

        assert_eq!(metrics.confusion_matrix.matrix, vec![vec![3, 1], vec![1, 3]]);
        assert!((metrics.accuracy - 0.75).abs() < 1e-12);
        assert!((metrics.precision - 0.75).abs() < 1e-12);
        assert!((metrics.recall - 0.75).abs() < 1e-12);
        assert!((metrics.f1_score - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_confusion_matrix_uses_observed_labels() {
        let y_true = array![0.0, 0.0, 2.0];
        let y_pred = array![0.0, 2.0, 2.0];
        let cm = ConfusionMatrix::compute(&y_true, &y_pred);

        assert_eq!(cm.labels, vec![0, 2]);
        assert_eq!(cm.matrix, vec![vec![1, 1], vec![0, 1]]);
        assert_eq!(cm.total(), 3);
    }

    #[test]
    fn test_f1_zero_without_positives() {
        let y_true = array![0.0, 0.0];
        let y_pred = array![0.0, 0.0];
        let metrics = ClassificationMetrics::compute(&y_true, &y_pred);

        assert_eq!(metrics.f1_score, 0.0);
        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.confusion_matrix.matrix, vec![vec![2]]);
    }

    #[test]
    fn test_multiclass_f1_scores_class_one() {
        let y_true = array![0.0, 1.0, 2.0, 1.0, 2.0];
        let y_pred = array![0.0, 1.0, 1.0, 1.0, 2.0];
        let metrics = ClassificationMetrics::compute(&y_true, &y_pred);

        // class 1: tp = 2, fp = 1, fn = 0
        assert!((metrics.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(metrics.recall, 1.0);
        assert!((metrics.f1_score - 0.8).abs() < 1e-12);
        assert_eq!(metrics.confusion_matrix.labels, vec![0, 1, 2]);
    }
}
