//! Warm-started classifier fitting over contiguous row chunks.

use std::collections::BTreeSet;
use std::ops::Range;

use ndarray::{ArrayView1, ArrayView2, Axis};

use crate::classifier::{FitOutcome, LogisticRegression, LogisticRegressionConfig};
use crate::config::ReferenceClassifierConfig;
use crate::error::{Result, TrainError};

/// Split `0..n` into `k` contiguous ranges of near-equal length.
///
/// The first `n % k` ranges hold one extra row. With `k > n` the trailing
/// ranges are empty.
///
/// ```rust
/// use sitsgen_train::chunk_bounds;
///
/// assert_eq!(chunk_bounds(10, 3), vec![0..4, 4..7, 7..10]);
/// ```
#[must_use]
pub fn chunk_bounds(n: usize, k: usize) -> Vec<Range<usize>> {
    if k == 0 {
        return Vec::new();
    }
    let (base, extra) = (n / k, n % k);
    let mut start = 0;
    (0..k)
        .map(|i| {
            let end = start + base + usize::from(i < extra);
            let range = start..end;
            start = end;
            range
        })
        .collect()
}

/// Result of [`fit_by_chunks`].
#[derive(Debug, Clone)]
pub struct ChunkedFit {
    /// The classifier after the last chunk.
    pub classifier: LogisticRegression,
    /// Outcome of every chunk that was fitted, in chunk order.
    pub outcomes: Vec<FitOutcome>,
}

impl ChunkedFit {
    /// Number of chunk fits that did not converge.
    #[must_use]
    pub fn n_not_converged(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_converged()).count()
    }
}

/// Fit a warm-started logistic regression on `n_chunks` consecutive chunks of `x`.
///
/// Rows are expected to be shuffled already, so contiguous chunks are random
/// partitions. Each chunk fit starts from the previous one's weights. A chunk
/// that does not converge, or whose labels alone cannot start a fresh fit, is
/// logged and skipped over; later chunks carry on from the current state.
///
/// # Errors
///
/// [`TrainError::ShapeMismatch`] if `x` and `y` differ in length,
/// [`TrainError::InvalidConfig`] for invalid hyperparameters and
/// [`TrainError::InvalidData`] if no chunk could be fitted at all.
pub fn fit_by_chunks(
    x: ArrayView2<'_, f32>,
    y: ArrayView1<'_, i64>,
    config: &ReferenceClassifierConfig,
    n_jobs: usize,
) -> Result<ChunkedFit> {
    config.validate()?;
    if x.nrows() != y.len() {
        return Err(TrainError::ShapeMismatch(format!(
            "{} feature rows with {} labels",
            x.nrows(),
            y.len()
        )));
    }

    let mut classifier = LogisticRegression::new(LogisticRegressionConfig {
        c: config.l2_weight,
        tol: config.tol,
        max_iter: config.max_iter,
        seed: config.seed,
        warm_start: true,
        n_jobs,
    });
    let n_labels = y.iter().collect::<BTreeSet<_>>().len();
    let chunks = chunk_bounds(x.nrows(), config.n_chunks);
    let n_chunks = chunks.len();
    let mut outcomes = Vec::with_capacity(n_chunks);

    for (i, range) in chunks.into_iter().enumerate() {
        if range.is_empty() {
            tracing::warn!("Chunk {}/{} is empty, skipping", i + 1, n_chunks);
            continue;
        }
        if range.len() < n_labels {
            tracing::warn!(
                "Chunk {}/{} has {} rows for {} labels, the fit may not converge",
                i + 1,
                n_chunks,
                range.len(),
                n_labels
            );
        }
        tracing::info!("Fitting chunk {}/{} ({} rows)", i + 1, n_chunks, range.len());

        let xs = x.slice_axis(Axis(0), range.clone().into());
        let ys = y.slice_axis(Axis(0), range.into());
        match classifier.fit(xs, ys) {
            Ok(outcome) => {
                if !outcome.is_converged() {
                    tracing::warn!("Chunk {}/{} did not converge, continuing", i + 1, n_chunks);
                }
                outcomes.push(outcome);
            }
            Err(TrainError::InvalidData(reason)) => {
                tracing::warn!("Chunk {}/{} skipped: {}", i + 1, n_chunks, reason);
            }
            Err(e) => return Err(e),
        }
    }

    if !classifier.is_fitted() {
        return Err(TrainError::InvalidData(format!(
            "none of the {} chunks could be fitted",
            n_chunks
        )));
    }
    Ok(ChunkedFit { classifier, outcomes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn toy(n: usize) -> (Array2<f32>, Array1<i64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            let class = (i % 2) as f32;
            class * 4.0 + ((i * 7 + j * 3) % 5) as f32 * 0.1
        });
        let y = Array1::from_shape_fn(n, |i| (i % 2) as i64 + 1);
        (x, y)
    }

    fn config(n_chunks: usize) -> ReferenceClassifierConfig {
        ReferenceClassifierConfig {
            train_set_size: None,
            l2_weight: 1.0,
            n_chunks,
            tol: 1e-3,
            seed: 11,
            max_iter: 100,
        }
    }

    #[test]
    fn test_chunk_bounds() {
        assert_eq!(chunk_bounds(10, 3), vec![0..4, 4..7, 7..10]);
        assert_eq!(chunk_bounds(9, 3), vec![0..3, 3..6, 6..9]);
        assert_eq!(chunk_bounds(2, 4), vec![0..1, 1..2, 2..2, 2..2]);
        assert_eq!(chunk_bounds(5, 1), vec![0..5]);
        assert!(chunk_bounds(5, 0).is_empty());

        let bounds = chunk_bounds(103, 7);
        assert_eq!(bounds.iter().map(|r| r.len()).sum::<usize>(), 103);
        assert_eq!(bounds.last().map(|r| r.end), Some(103));
    }

    #[test]
    fn test_single_chunk_matches_single_fit() {
        let (x, y) = toy(60);
        let chunked = fit_by_chunks(x.view(), y.view(), &config(1), 1).unwrap();

        let mut single = LogisticRegression::new(LogisticRegressionConfig {
            c: 1.0,
            tol: 1e-3,
            max_iter: 100,
            seed: 11,
            warm_start: true,
            n_jobs: 1,
        });
        single.fit(x.view(), y.view()).unwrap();

        assert_eq!(chunked.outcomes.len(), 1);
        assert_eq!(
            chunked.classifier.predict(x.view()).unwrap(),
            single.predict(x.view()).unwrap()
        );
        assert_eq!(chunked.classifier.coef(), single.coef());
    }

    #[test]
    fn test_multiple_chunks() {
        let (x, y) = toy(90);
        let fit = fit_by_chunks(x.view(), y.view(), &config(3), 2).unwrap();
        assert_eq!(fit.outcomes.len(), 3);
        assert_eq!(fit.classifier.classes(), &[1, 2]);
        assert!(fit.classifier.score(x.view(), y.view()).unwrap() > 0.95);
    }

    #[test]
    fn test_single_class_first_chunk_is_skipped() {
        // first chunk holds only label 1
        let x = Array2::from_shape_fn((8, 1), |(i, _)| if i < 4 { 0.0 } else { (i % 2) as f32 * 3.0 });
        let y = Array1::from_vec(vec![1, 1, 1, 1, 1, 2, 1, 2]);
        let fit = fit_by_chunks(x.view(), y.view(), &config(2), 1).unwrap();
        assert_eq!(fit.outcomes.len(), 1);
        assert_eq!(fit.classifier.classes(), &[1, 2]);
    }

    #[test]
    fn test_more_chunks_than_rows() {
        // 5 single-row chunks then 3 empty ones; a lone label cannot start a fit
        let (x, y) = toy(5);
        assert_eq!(chunk_bounds(5, 8).iter().filter(|r| r.is_empty()).count(), 3);
        match fit_by_chunks(x.view(), y.view(), &config(8), 1) {
            Err(TrainError::InvalidData(reason)) => assert!(reason.contains("8 chunks")),
            other => panic!("expected InvalidData, got {:?}", other.map(|fit| fit.outcomes)),
        }
    }

    #[test]
    fn test_errors() {
        let (x, y) = toy(10);
        assert!(matches!(
            fit_by_chunks(x.view(), y.slice(ndarray::s![..9]), &config(1), 1),
            Err(TrainError::ShapeMismatch(_))
        ));
        assert!(matches!(
            fit_by_chunks(x.view(), y.view(), &config(0), 1),
            Err(TrainError::InvalidConfig(_))
        ));
        let ones = Array1::from_elem(10, 1);
        assert!(matches!(
            fit_by_chunks(x.view(), ones.view(), &config(2), 1),
            Err(TrainError::InvalidData(_))
        ));
    }
}
