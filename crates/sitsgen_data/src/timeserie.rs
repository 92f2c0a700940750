//! A single labeled multivariate series with horizon-bounded iteration.

use ndarray::{Array2, ArrayView1};
use rand::Rng;

use sitsgen_core::Seed;

use crate::error::{DataError, Result};

/// A labeled `(n_steps, n_dim)` series.
///
/// When a horizon is set, each call to [`TimeSerie::iter`] exposes a window
/// of `horizon` consecutive steps starting at an offset drawn uniformly from
/// `[0, n_steps - horizon]`. Without a fixed seed the offset is redrawn on
/// every call, so two iterations may read different windows. With a fixed
/// seed every iteration reads the same window.
///
/// # Example
///
/// ```rust,ignore
/// use sitsgen_core::Seed;
/// use sitsgen_data::TimeSerie;
///
/// let serie = TimeSerie::new(ts, 1, Some(10), None)?;
/// let mut rng = Seed::new(0).to_rng();
/// for step in serie.iter(&mut rng) {
///     assert_eq!(step.len(), serie.ndim());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TimeSerie {
    ts: Array2<f32>,
    label: i64,
    horizon: Option<usize>,
    seed: Option<Seed>,
}

impl TimeSerie {
    /// Create a new series.
    ///
    /// A horizon of `Some(0)` is treated as no horizon.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidHorizon`] if the horizon is longer than the series.
    pub fn new(ts: Array2<f32>, label: i64, horizon: Option<usize>, seed: Option<Seed>) -> Result<Self> {
        let horizon = horizon.filter(|&h| h > 0);
        if let Some(h) = horizon {
            if h > ts.nrows() {
                return Err(DataError::InvalidHorizon {
                    horizon: h,
                    length: ts.nrows(),
                });
            }
        }
        Ok(Self {
            ts,
            label,
            horizon,
            seed,
        })
    }

    /// Underlying full series.
    #[must_use]
    pub fn ts(&self) -> &Array2<f32> {
        &self.ts
    }

    /// Series label.
    #[must_use]
    pub fn label(&self) -> i64 {
        self.label
    }

    /// Window horizon, if any.
    #[must_use]
    pub fn horizon(&self) -> Option<usize> {
        self.horizon
    }

    /// Fixed seed for window draws, if any.
    #[must_use]
    pub fn seed(&self) -> Option<Seed> {
        self.seed
    }

    /// Number of dimensions per step.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.ts.ncols()
    }

    /// Horizon if set, full series length otherwise.
    #[must_use]
    pub fn len(&self) -> usize {
        self.horizon.unwrap_or_else(|| self.ts.nrows())
    }

    /// Check if iteration yields no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Draw the first step of the next window.
    ///
    /// Uses a fresh RNG from the fixed seed when one is set, `rng` otherwise.
    pub fn pick_starting_point<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let Some(horizon) = self.horizon else {
            return 0;
        };
        let last_start = self.ts.nrows() - horizon;
        match self.seed {
            Some(seed) => seed.to_rng().gen_range(0..=last_start),
            None => rng.gen_range(0..=last_start),
        }
    }

    /// Iterate over the `(n_dim,)` steps of a freshly drawn window.
    pub fn iter<R: Rng + ?Sized>(&self, rng: &mut R) -> Window<'_> {
        let start = self.pick_starting_point(rng);
        Window {
            ts: &self.ts,
            start,
            pos: start,
            end: start + self.len(),
        }
    }
}

/// Iterator over the steps of one window of a [`TimeSerie`].
#[derive(Debug, Clone)]
pub struct Window<'a> {
    ts: &'a Array2<f32>,
    start: usize,
    pos: usize,
    end: usize,
}

impl<'a> Window<'a> {
    /// Offset of the window's first step in the full series.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Collect the remaining steps as a `(steps, n_dim)` array.
    #[must_use]
    pub fn to_array(&self) -> Array2<f32> {
        self.ts.slice(ndarray::s![self.pos..self.end, ..]).to_owned()
    }
}

impl<'a> Iterator for Window<'a> {
    type Item = ArrayView1<'a, f32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        let row = self.ts.row(self.pos);
        self.pos += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.pos;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for Window<'a> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n_steps: usize, n_dim: usize) -> Array2<f32> {
        Array2::from_shape_fn((n_steps, n_dim), |(t, d)| (t * 10 + d) as f32)
    }

    #[test]
    fn test_len_without_horizon() {
        let serie = TimeSerie::new(ramp(8, 2), 3, None, None).unwrap();
        assert_eq!(serie.len(), 8);
        assert_eq!(serie.ndim(), 2);

        let mut rng = Seed::new(0).to_rng();
        let window = serie.iter(&mut rng);
        assert_eq!(window.start(), 0);
        assert_eq!(window.count(), 8);
    }

    #[test]
    fn test_horizon_window_is_contiguous() {
        let serie = TimeSerie::new(ramp(20, 3), 1, Some(5), None).unwrap();
        let mut rng = Seed::new(11).to_rng();
        for _ in 0..20 {
            let window = serie.iter(&mut rng);
            let start = window.start();
            assert!(start + 5 <= 20);
            let steps: Vec<f32> = window.map(|step| step[0]).collect();
            let expected: Vec<f32> = (start..start + 5).map(|t| (t * 10) as f32).collect();
            assert_eq!(steps, expected);
        }
    }

    #[test]
    fn test_fixed_seed_repeats_window() {
        let serie = TimeSerie::new(ramp(50, 1), 1, Some(4), Some(Seed::new(9))).unwrap();
        let mut rng = Seed::new(1).to_rng();
        let first = serie.iter(&mut rng).start();
        for _ in 0..10 {
            assert_eq!(serie.iter(&mut rng).start(), first);
        }
    }

    #[test]
    fn test_unseeded_windows_vary() {
        let serie = TimeSerie::new(ramp(100, 1), 1, Some(2), None).unwrap();
        let mut rng = Seed::new(5).to_rng();
        let starts: std::collections::HashSet<usize> = (0..30).map(|_| serie.iter(&mut rng).start()).collect();
        assert!(starts.len() > 1);
    }

    #[test]
    fn test_invalid_horizon() {
        let err = TimeSerie::new(ramp(3, 1), 1, Some(4), None).unwrap_err();
        assert!(matches!(err, DataError::InvalidHorizon { horizon: 4, length: 3 }));
    }

    #[test]
    fn test_full_length_horizon_starts_at_zero() {
        let serie = TimeSerie::new(ramp(6, 1), 1, Some(6), None).unwrap();
        let mut rng = Seed::new(2).to_rng();
        assert_eq!(serie.iter(&mut rng).start(), 0);
        assert_eq!(serie.iter(&mut rng).to_array().nrows(), 6);
    }
}
