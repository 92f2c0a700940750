//! Multinomial logistic regression fitted by stochastic average gradient.
//!
//! The solver minimizes the mean multinomial log loss plus
//! `0.5 / (C * n) * ||W||^2`, with an unpenalized intercept. Each epoch
//! draws `n` samples uniformly with replacement from a seeded RNG, keeps the
//! last loss gradient seen for every sample and steps along their average.
//! An epoch converges when the largest weight change relative to the
//! largest weight falls below the tolerance.
//!
//! With warm start, a fit starts from the current weights and class list.
//! Labels first seen in a later fit join the sorted class list with zero
//! weights.

use std::collections::BTreeSet;

use ndarray::parallel::prelude::*;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use rand::Rng;
use serde::{Deserialize, Serialize};

use sitsgen_core::Seed;

use crate::error::{Result, TrainError};

/// Hyperparameters of [`LogisticRegression`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionConfig {
    /// Inverse L2 regularization strength.
    pub c: f64,
    /// Tolerance on the relative weight change per epoch.
    pub tol: f64,
    /// Maximum number of epochs per fit.
    pub max_iter: usize,
    /// Seed of the sample order.
    pub seed: u64,
    /// Reuse the current solution as the starting point of the next fit.
    pub warm_start: bool,
    /// Worker threads for batch computations, 0 for one per core.
    pub n_jobs: usize,
}

impl Default for LogisticRegressionConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            tol: 1e-4,
            max_iter: 1000,
            seed: 0,
            warm_start: false,
            n_jobs: 1,
        }
    }
}

/// How a fit ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitOutcome {
    /// The tolerance was met.
    Converged {
        /// Epochs run.
        epochs: usize,
    },
    /// `max_iter` epochs ran without meeting the tolerance.
    NotConverged {
        /// Epochs run.
        epochs: usize,
        /// Relative weight change of the last epoch.
        relative_change: f64,
    },
}

impl FitOutcome {
    /// Check if the fit converged.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self, FitOutcome::Converged { .. })
    }

    /// Number of epochs run.
    #[must_use]
    pub fn epochs(&self) -> usize {
        match *self {
            FitOutcome::Converged { epochs } | FitOutcome::NotConverged { epochs, .. } => epochs,
        }
    }
}

/// Multinomial logistic regression classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    config: LogisticRegressionConfig,
    classes: Vec<i64>,
    /// `(n_classes, n_features)` weights.
    coef: Option<Array2<f64>>,
    /// `(n_classes,)` intercepts.
    intercept: Option<Array1<f64>>,
    n_iter: usize,
}

impl LogisticRegression {
    /// Create an unfitted classifier.
    #[must_use]
    pub fn new(config: LogisticRegressionConfig) -> Self {
        Self {
            config,
            classes: Vec::new(),
            coef: None,
            intercept: None,
            n_iter: 0,
        }
    }

    /// Hyperparameters.
    #[must_use]
    pub fn config(&self) -> &LogisticRegressionConfig {
        &self.config
    }

    /// Class labels in the order of weight rows and probability columns.
    #[must_use]
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    /// Fitted weights, `(n_classes, n_features)`.
    #[must_use]
    pub fn coef(&self) -> Option<&Array2<f64>> {
        self.coef.as_ref()
    }

    /// Fitted intercepts.
    #[must_use]
    pub fn intercept(&self) -> Option<&Array1<f64>> {
        self.intercept.as_ref()
    }

    /// Epochs run by the last fit.
    #[must_use]
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Check if the classifier has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.coef.is_some()
    }

    /// Number of features seen during fit.
    #[must_use]
    pub fn n_features(&self) -> Option<usize> {
        self.coef.as_ref().map(Array2::ncols)
    }

    fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.n_jobs)
            .build()
            .map_err(|e| TrainError::ThreadPool(format!("Failed to create thread pool: {}", e)))
    }

    /// Fit on `x` (`n_samples x n_features`) and labels `y`.
    ///
    /// # Errors
    ///
    /// [`TrainError::ShapeMismatch`] if `x` and `y` differ in length or `x`
    /// differs in width from a warm start solution, and
    /// [`TrainError::InvalidData`] for an empty `x` or when fewer than two
    /// classes are known.
    pub fn fit(&mut self, x: ArrayView2<'_, f32>, y: ArrayView1<'_, i64>) -> Result<FitOutcome> {
        let (n_samples, n_features) = x.dim();
        if n_samples != y.len() {
            return Err(TrainError::ShapeMismatch(format!(
                "{} samples with {} labels",
                n_samples,
                y.len()
            )));
        }
        if n_samples == 0 {
            return Err(TrainError::InvalidData("cannot fit on 0 samples".to_string()));
        }

        let warm = self.config.warm_start && self.is_fitted();
        if warm && self.n_features() != Some(n_features) {
            return Err(TrainError::ShapeMismatch(format!(
                "{} features, fitted with {}",
                n_features,
                self.n_features().unwrap_or_default()
            )));
        }

        let mut labels: BTreeSet<i64> = y.iter().copied().collect();
        if warm {
            labels.extend(self.classes.iter().copied());
        }
        let classes: Vec<i64> = labels.into_iter().collect();
        if classes.len() < 2 {
            return Err(TrainError::InvalidData(format!(
                "needs samples of at least 2 classes, got {:?}",
                classes
            )));
        }

        let mut coef = Array2::<f64>::zeros((classes.len(), n_features));
        let mut intercept = Array1::<f64>::zeros(classes.len());
        if let (true, Some(old_coef), Some(old_intercept)) = (warm, &self.coef, &self.intercept) {
            for (row, class) in self.classes.iter().enumerate() {
                if let Ok(new_row) = classes.binary_search(class) {
                    coef.row_mut(new_row).assign(&old_coef.row(row));
                    intercept[new_row] = old_intercept[row];
                }
            }
        }

        let targets: Vec<usize> = y
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_default())
            .collect();

        let pool = self.thread_pool()?;
        let max_squared_sum = pool.install(|| {
            x.axis_iter(Axis(0))
                .into_par_iter()
                .map(|row| row.iter().map(|&v| f64::from(v).powi(2)).sum::<f64>())
                .reduce(|| 0.0, f64::max)
        });

        let outcome = self.sag(x, &targets, &mut coef, &mut intercept, max_squared_sum);
        match outcome {
            FitOutcome::Converged { epochs } => {
                tracing::debug!("SAG converged after {} epochs on {} samples", epochs, n_samples);
            }
            FitOutcome::NotConverged { epochs, relative_change } => {
                tracing::warn!(
                    "SAG did not converge after {} epochs (relative change {:.3e} > tol {:.3e})",
                    epochs,
                    relative_change,
                    self.config.tol
                );
            }
        }

        self.classes = classes;
        self.coef = Some(coef);
        self.intercept = Some(intercept);
        self.n_iter = outcome.epochs();
        Ok(outcome)
    }

    fn sag(
        &self,
        x: ArrayView2<'_, f32>,
        targets: &[usize],
        coef: &mut Array2<f64>,
        intercept: &mut Array1<f64>,
        max_squared_sum: f64,
    ) -> FitOutcome {
        let (n_samples, n_features) = x.dim();
        let n_classes = coef.nrows();
        let alpha = 1.0 / (self.config.c * n_samples as f64);
        let step = 1.0 / (0.25 * (max_squared_sum + 1.0) + alpha);
        let decay = 1.0 - step * alpha;

        let mut rng = Seed::new(self.config.seed).to_rng();
        let mut memory = Array2::<f64>::zeros((n_samples, n_classes));
        let mut seen = vec![false; n_samples];
        let mut n_seen = 0usize;
        let mut sum_gradient = Array2::<f64>::zeros((n_classes, n_features));
        let mut sum_intercept = Array1::<f64>::zeros(n_classes);
        let mut gradient = Array1::<f64>::zeros(n_classes);
        let mut previous = coef.clone();
        let mut relative_change = f64::INFINITY;

        for epoch in 1..=self.config.max_iter {
            for _ in 0..n_samples {
                let i = rng.gen_range(0..n_samples);
                let xi = x.row(i);

                linear_scores(coef, intercept, xi, &mut gradient);
                softmax_inplace(&mut gradient);
                gradient[targets[i]] -= 1.0;

                if !seen[i] {
                    seen[i] = true;
                    n_seen += 1;
                }
                for k in 0..n_classes {
                    let delta = gradient[k] - memory[[i, k]];
                    if delta != 0.0 {
                        sum_gradient
                            .row_mut(k)
                            .zip_mut_with(&xi, |s, &v| *s += delta * f64::from(v));
                        sum_intercept[k] += delta;
                    }
                    memory[[i, k]] = gradient[k];
                }

                let scale = step / n_seen as f64;
                coef.mapv_inplace(|w| w * decay);
                coef.scaled_add(-scale, &sum_gradient);
                intercept.scaled_add(-scale, &sum_intercept);
            }

            let (max_change, max_weight) = coef
                .iter()
                .zip(previous.iter())
                .fold((0.0f64, 0.0f64), |(change, weight), (&w, &p)| {
                    (change.max((w - p).abs()), weight.max(w.abs()))
                });
            relative_change = if max_weight > 0.0 {
                max_change / max_weight
            } else if max_change == 0.0 {
                0.0
            } else {
                f64::INFINITY
            };
            if relative_change <= self.config.tol {
                return FitOutcome::Converged { epochs: epoch };
            }
            previous.assign(coef);
        }

        FitOutcome::NotConverged {
            epochs: self.config.max_iter,
            relative_change,
        }
    }

    /// Class probabilities, `(n_samples, n_classes)` in [`Self::classes`] order.
    pub fn predict_proba(&self, x: ArrayView2<'_, f32>) -> Result<Array2<f64>> {
        let (coef, intercept) = self.check_input(x)?;
        let mut proba = Array2::<f64>::zeros((x.nrows(), coef.nrows()));
        self.thread_pool()?.install(|| {
            Zip::from(proba.rows_mut())
                .and(x.rows())
                .par_for_each(|mut out, xi| {
                    let mut scores = Array1::zeros(coef.nrows());
                    linear_scores(coef, intercept, xi, &mut scores);
                    softmax_inplace(&mut scores);
                    out.assign(&scores);
                });
        });
        Ok(proba)
    }

    /// Most probable class of every sample.
    pub fn predict(&self, x: ArrayView2<'_, f32>) -> Result<Array1<i64>> {
        let (coef, intercept) = self.check_input(x)?;
        let mut predictions = Array1::<i64>::zeros(x.nrows());
        self.thread_pool()?.install(|| {
            Zip::from(&mut predictions)
                .and(x.rows())
                .par_for_each(|out, xi| {
                    let mut scores = Array1::zeros(coef.nrows());
                    linear_scores(coef, intercept, xi, &mut scores);
                    *out = self.classes[argmax(scores.view())];
                });
        });
        Ok(predictions)
    }

    /// Mean accuracy of [`Self::predict`] against `y`.
    pub fn score(&self, x: ArrayView2<'_, f32>, y: ArrayView1<'_, i64>) -> Result<f64> {
        if x.nrows() != y.len() {
            return Err(TrainError::ShapeMismatch(format!(
                "{} samples with {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if y.is_empty() {
            return Err(TrainError::InvalidData("cannot score 0 samples".to_string()));
        }
        let predictions = self.predict(x)?;
        let correct = predictions.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        Ok(correct as f64 / y.len() as f64)
    }

    fn check_input(&self, x: ArrayView2<'_, f32>) -> Result<(&Array2<f64>, &Array1<f64>)> {
        let (coef, intercept) = match (&self.coef, &self.intercept) {
            (Some(coef), Some(intercept)) => (coef, intercept),
            _ => return Err(TrainError::NotFitted),
        };
        if x.ncols() != coef.ncols() {
            return Err(TrainError::ShapeMismatch(format!(
                "{} features, fitted with {}",
                x.ncols(),
                coef.ncols()
            )));
        }
        Ok((coef, intercept))
    }
}

/// `out[k] = intercept[k] + coef[k] . x`.
fn linear_scores(coef: &Array2<f64>, intercept: &Array1<f64>, x: ArrayView1<'_, f32>, out: &mut Array1<f64>) {
    for (k, w) in coef.rows().into_iter().enumerate() {
        out[k] = intercept[k] + w.iter().zip(x.iter()).map(|(&w, &v)| w * f64::from(v)).sum::<f64>();
    }
}

fn softmax_inplace(z: &mut Array1<f64>) {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    z.mapv_inplace(|v| (v - max).exp());
    let sum = z.sum();
    z.mapv_inplace(|v| v / sum);
}

fn argmax(z: ArrayView1<'_, f64>) -> usize {
    z.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_value), (i, &v)| {
            if v > best_value {
                (i, v)
            } else {
                (best, best_value)
            }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;
    use rand::SeedableRng;

    /// Gaussian-ish blobs around one center per label.
    fn blobs(centers: &[(i64, [f32; 2])], per_class: usize, seed: u64) -> (Array2<f32>, Array1<i64>) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let n = centers.len() * per_class;
        let mut x = Array2::<f32>::zeros((n, 2));
        let mut y = Array1::<i64>::zeros(n);
        for (c, &(label, center)) in centers.iter().enumerate() {
            for i in 0..per_class {
                let row = c * per_class + i;
                x[[row, 0]] = center[0] + rng.gen_range(-0.5..0.5);
                x[[row, 1]] = center[1] + rng.gen_range(-0.5..0.5);
                y[row] = label;
            }
        }
        (x, y)
    }

    fn config() -> LogisticRegressionConfig {
        LogisticRegressionConfig {
            c: 10.0,
            tol: 1e-4,
            max_iter: 200,
            seed: 7,
            warm_start: true,
            n_jobs: 2,
        }
    }

    #[test]
    fn test_fit_separable_blobs() {
        let (x, y) = blobs(&[(1, [0.0, 0.0]), (2, [3.0, 3.0]), (3, [-3.0, 3.0])], 30, 0);
        let mut clf = LogisticRegression::new(config());
        let outcome = clf.fit(x.view(), y.view()).unwrap();

        assert!(outcome.epochs() >= 1);
        assert_eq!(clf.classes(), &[1, 2, 3]);
        assert!(clf.score(x.view(), y.view()).unwrap() > 0.95);

        let proba = clf.predict_proba(x.view()).unwrap();
        assert_eq!(proba.dim(), (90, 3));
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = blobs(&[(0, [0.0, 1.0]), (5, [2.0, -1.0])], 20, 1);
        let mut a = LogisticRegression::new(config());
        let mut b = LogisticRegression::new(config());
        a.fit(x.view(), y.view()).unwrap();
        b.fit(x.view(), y.view()).unwrap();
        assert_eq!(a.coef(), b.coef());
        assert_eq!(a.intercept(), b.intercept());
    }

    #[test]
    fn test_warm_start_merges_classes() {
        let (x1, y1) = blobs(&[(1, [0.0, 0.0]), (2, [3.0, 3.0])], 20, 2);
        let (x2, y2) = blobs(&[(2, [3.0, 3.0]), (4, [-3.0, 3.0])], 20, 3);
        let mut clf = LogisticRegression::new(config());
        clf.fit(x1.view(), y1.view()).unwrap();
        let before = clf.coef().unwrap().row(0).to_owned();

        // a single known class is enough once warm started
        let single = Array1::from_elem(5, 2);
        clf.fit(x1.slice(ndarray::s![20..25, ..]), single.view()).unwrap();

        clf.fit(x2.view(), y2.view()).unwrap();
        assert_eq!(clf.classes(), &[1, 2, 4]);
        assert_eq!(clf.coef().unwrap().nrows(), 3);
        assert_ne!(clf.coef().unwrap().row(0), before);
        assert!(clf.score(x2.view(), y2.view()).unwrap() > 0.9);
    }

    #[test]
    fn test_cold_start_resets() {
        let (x1, y1) = blobs(&[(1, [0.0, 0.0]), (2, [3.0, 3.0])], 10, 4);
        let (x2, y2) = blobs(&[(3, [0.0, 0.0]), (4, [3.0, 3.0])], 10, 5);
        let mut clf = LogisticRegression::new(LogisticRegressionConfig {
            warm_start: false,
            ..config()
        });
        clf.fit(x1.view(), y1.view()).unwrap();
        clf.fit(x2.view(), y2.view()).unwrap();
        assert_eq!(clf.classes(), &[3, 4]);
    }

    #[test]
    fn test_not_converged() {
        let (x, y) = blobs(&[(1, [0.0, 0.0]), (2, [1.0, 1.0])], 10, 6);
        let mut clf = LogisticRegression::new(LogisticRegressionConfig {
            max_iter: 1,
            tol: 1e-12,
            ..config()
        });
        let outcome = clf.fit(x.view(), y.view()).unwrap();
        assert!(!outcome.is_converged());
        assert_eq!(clf.n_iter(), 1);
        assert!(clf.is_fitted());
    }

    #[test]
    fn test_invalid_inputs() {
        let x = Array2::<f32>::zeros((4, 2));
        let mut clf = LogisticRegression::new(config());
        assert!(matches!(clf.predict(x.view()), Err(TrainError::NotFitted)));
        assert!(matches!(
            clf.fit(x.view(), Array1::from_elem(3, 1).view()),
            Err(TrainError::ShapeMismatch(_))
        ));
        assert!(matches!(
            clf.fit(x.view(), Array1::from_elem(4, 1).view()),
            Err(TrainError::InvalidData(_))
        ));

        clf.fit(x.view(), Array1::from_vec(vec![1, 2, 1, 2]).view()).unwrap();
        assert!(matches!(
            clf.predict(Array2::<f32>::zeros((1, 3)).view()),
            Err(TrainError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_json_keeps_predictions() {
        let (x, y) = blobs(&[(1, [0.0, 0.0]), (2, [3.0, 3.0])], 10, 8);
        let mut clf = LogisticRegression::new(config());
        clf.fit(x.view(), y.view()).unwrap();
        let json = serde_json::to_string(&clf).unwrap();
        let restored: LogisticRegression = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.predict(x.view()).unwrap(), clf.predict(x.view()).unwrap());
    }
}
