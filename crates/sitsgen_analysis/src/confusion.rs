//! Confusion matrix computation and rendering.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

/// Confusion matrix over an ordered set of class labels.
///
/// Row `i` counts samples whose true label is `labels[i]`, column `j` those
/// predicted as `labels[j]`. The label order is the caller's, typically the
/// order a classifier learned its classes in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// The matrix values (row = true, col = pred).
    pub matrix: Vec<Vec<usize>>,
    /// Class labels, one per row and column.
    pub labels: Vec<i64>,
}

/// Confusion matrix with every non-empty row scaled to sum to 1.
///
/// Cell `(i, j)` estimates `P(predicted = labels[j] | true = labels[i])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedConfusion {
    /// Row-normalized values.
    pub matrix: Vec<Vec<f64>>,
    /// Class labels, one per row and column.
    pub labels: Vec<i64>,
}

impl ConfusionMatrix {
    /// Create an empty confusion matrix over `labels`.
    pub fn new(labels: Vec<i64>) -> Self {
        let n = labels.len();
        Self {
            matrix: vec![vec![0; n]; n],
            labels,
        }
    }

    /// Number of classes.
    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }

    /// Position of `label` in the class order.
    pub fn position(&self, label: i64) -> Option<usize> {
        self.labels.iter().position(|&l| l == label)
    }

    /// Add a prediction. Pairs involving a label outside the class set are ignored.
    pub fn add(&mut self, true_label: i64, pred_label: i64) {
        if let (Some(i), Some(j)) = (self.position(true_label), self.position(pred_label)) {
            self.matrix[i][j] += 1;
        }
    }

    /// Number of counted samples.
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Normalize the matrix row-wise. Rows without samples stay zero.
    pub fn normalize(&self) -> NormalizedConfusion {
        let matrix = self
            .matrix
            .iter()
            .map(|row| {
                let sum: usize = row.iter().sum();
                if sum == 0 {
                    vec![0.0; row.len()]
                } else {
                    row.iter().map(|&v| v as f64 / sum as f64).collect()
                }
            })
            .collect();
        NormalizedConfusion {
            matrix,
            labels: self.labels.clone(),
        }
    }

    /// Get a text representation of the counts.
    pub fn to_string_table(&self) -> String {
        render_table(&self.labels, &self.matrix, |v| v.to_string())
    }
}

impl NormalizedConfusion {
    /// Get a text representation with three decimals per cell.
    pub fn to_string_table(&self) -> String {
        render_table(&self.labels, &self.matrix, |v| format!("{:.3}", v))
    }
}

fn render_table<T, F>(labels: &[i64], matrix: &[Vec<T>], cell: F) -> String
where
    F: Fn(&T) -> String,
{
    let mut s = String::new();

    // Header
    s.push_str("true\\pred");
    for label in labels {
        let _ = write!(s, "{:>8}", label);
    }
    s.push('\n');

    // Rows
    for (label, row) in labels.iter().zip(matrix) {
        let _ = write!(s, "{:>9}", label);
        for value in row {
            let _ = write!(s, "{:>8}", cell(value));
        }
        s.push('\n');
    }

    s
}

/// Compute confusion matrix from predictions and targets.
///
/// # Arguments
///
/// * `preds` - Predicted labels
/// * `targets` - True labels
/// * `labels` - Class labels, fixing row and column order
///
/// # Returns
///
/// A confusion matrix. Pairs are matched by position; pairs with a label
/// outside `labels` are not counted.
pub fn confusion_matrix(preds: &[i64], targets: &[i64], labels: &[i64]) -> ConfusionMatrix {
    let mut cm = ConfusionMatrix::new(labels.to_vec());
    for (&pred, &target) in preds.iter().zip(targets) {
        cm.add(target, pred);
    }
    cm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix() {
        let preds = vec![1, 1, 2, 2, 3, 3];
        let targets = vec![1, 2, 2, 2, 3, 1];

        let cm = confusion_matrix(&preds, &targets, &[1, 2, 3]);

        assert_eq!(cm.matrix[0][0], 1); // TP for class 1
        assert_eq!(cm.matrix[1][0], 1); // true 2, predicted 1
        assert_eq!(cm.matrix[1][1], 2); // TP for class 2
        assert_eq!(cm.total(), 6);
    }

    #[test]
    fn test_label_order_is_kept() {
        let cm = confusion_matrix(&[5, 5, 2], &[5, 2, 2], &[5, 2]);
        assert_eq!(cm.matrix, vec![vec![1, 0], vec![1, 1]]);
        assert_eq!(cm.position(2), Some(1));
    }

    #[test]
    fn test_unknown_labels_ignored() {
        let cm = confusion_matrix(&[1, 9], &[1, 1], &[1, 2]);
        assert_eq!(cm.total(), 1);
    }

    #[test]
    fn test_diagonal_counts() {
        let cm = confusion_matrix(&[1, 1, 2, 2], &[1, 2, 1, 2], &[1, 2]);
        assert_eq!(cm.matrix, vec![vec![1, 1], vec![1, 1]]);
        assert_eq!(cm.n_classes(), 2);
    }

    #[test]
    fn test_normalize_rows() {
        let cm = confusion_matrix(&[1, 2, 2, 2], &[1, 1, 1, 1], &[1, 2, 3]);
        let norm = cm.normalize();
        assert!((norm.matrix[0][0] - 0.25).abs() < 1e-12);
        assert!((norm.matrix[0][1] - 0.75).abs() < 1e-12);
        assert_eq!(norm.matrix[1], vec![0.0; 3]);
        assert_eq!(norm.labels, vec![1, 2, 3]);
    }

    #[test]
    fn test_string_table() {
        let cm = confusion_matrix(&[1, 2], &[1, 1], &[1, 2]);
        let table = cm.normalize().to_string_table();
        assert_eq!(table.lines().count(), 3);
        assert!(table.contains("0.500"));
    }

    #[test]
    fn test_normalized_json() {
        let cm = confusion_matrix(&[3, 4], &[3, 3], &[4, 3]);
        let json = serde_json::to_string(&cm.normalize()).unwrap();
        let back: NormalizedConfusion = serde_json::from_str(&json).unwrap();
        assert_eq!(back.labels, vec![4, 3]);
        assert_eq!(back.matrix[1], vec![0.5, 0.5]);
    }
}
