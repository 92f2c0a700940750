//! Classifier evaluation utilities.
//!
//! Scores a fitted classifier on materialized pixel arrays and builds the
//! confusion matrix over the classes it learned, in its class order.

use ndarray::{ArrayView1, ArrayView2};

use sitsgen_analysis::{confusion_matrix, ConfusionMatrix, NormalizedConfusion};

use crate::classifier::LogisticRegression;
use crate::error::{Result, TrainError};

/// Evaluation results with predictions and metrics.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    /// Predicted labels.
    pub predictions: Vec<i64>,
    /// True labels.
    pub targets: Vec<i64>,
    /// Fraction of correct predictions.
    pub accuracy: f64,
    /// Counts over the classifier's classes.
    pub confusion: ConfusionMatrix,
}

impl EvaluationResult {
    /// Number of correct predictions.
    pub fn correct(&self) -> usize {
        self.predictions
            .iter()
            .zip(&self.targets)
            .filter(|(p, t)| p == t)
            .count()
    }

    /// Number of evaluated samples.
    pub fn total(&self) -> usize {
        self.targets.len()
    }

    /// Row-normalized confusion matrix.
    pub fn normalized_confusion(&self) -> NormalizedConfusion {
        self.confusion.normalize()
    }
}

fn check_lengths(x: ArrayView2<'_, f32>, y: ArrayView1<'_, i64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(TrainError::ShapeMismatch(format!(
            "{} feature rows with {} labels",
            x.nrows(),
            y.len()
        )));
    }
    Ok(())
}

/// Fraction of rows of `x` whose predicted class equals `y`.
///
/// # Errors
///
/// [`TrainError::ShapeMismatch`] if `x` and `y` differ in length, and the
/// classifier's errors otherwise.
pub fn accuracy(x: ArrayView2<'_, f32>, y: ArrayView1<'_, i64>, classifier: &LogisticRegression) -> Result<f64> {
    check_lengths(x, y)?;
    classifier.score(x, y)
}

/// Row-normalized confusion matrix of the classifier on `(x, y)`.
///
/// Rows and columns follow [`LogisticRegression::classes`]. Rows of classes
/// absent from `y` are all zero.
pub fn confusion(
    x: ArrayView2<'_, f32>,
    y: ArrayView1<'_, i64>,
    classifier: &LogisticRegression,
) -> Result<NormalizedConfusion> {
    Ok(evaluate(x, y, classifier)?.normalized_confusion())
}

/// Predict every row of `x` and compare against `y`.
pub fn evaluate(
    x: ArrayView2<'_, f32>,
    y: ArrayView1<'_, i64>,
    classifier: &LogisticRegression,
) -> Result<EvaluationResult> {
    check_lengths(x, y)?;
    if y.is_empty() {
        return Err(TrainError::InvalidData("cannot evaluate 0 samples".to_string()));
    }

    let predictions = classifier.predict(x)?.to_vec();
    let targets = y.to_vec();
    let confusion = confusion_matrix(&predictions, &targets, classifier.classes());
    let correct = predictions.iter().zip(&targets).filter(|(p, t)| p == t).count();

    let result = EvaluationResult {
        accuracy: correct as f64 / targets.len() as f64,
        predictions,
        targets,
        confusion,
    };
    tracing::debug!(
        "Evaluated {} samples over {} classes",
        result.total(),
        result.confusion.n_classes()
    );
    Ok(result)
}
