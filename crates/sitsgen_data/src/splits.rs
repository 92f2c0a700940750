//! Index splitting utilities.

use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};
use sitsgen_core::{Seed, Split};

/// Dataset indices assigned to each split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitIndices {
    /// Training indices.
    pub train: Vec<usize>,
    /// Validation indices.
    pub valid: Vec<usize>,
    /// Test indices, empty for two-way splits.
    pub test: Vec<usize>,
}

impl SplitIndices {
    /// Indices of `split`.
    #[must_use]
    pub fn get(&self, split: Split) -> &[usize] {
        match split {
            Split::Train => &self.train,
            Split::Valid => &self.valid,
            Split::Test => &self.test,
        }
    }

    /// Total number of assigned indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.train.len() + self.valid.len() + self.test.len()
    }

    /// Check if no index is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Randomly split `0..n` into train, validation and optional test indices.
///
/// `ratios` holds two (train, valid) or three (train, valid, test) fractions
/// summing to at most 1. Split sizes are taken from the cumulative ratios,
/// and when the ratios sum to 1 the rounding remainder goes to the last split.
/// Each split keeps the permuted order.
///
/// # Arguments
///
/// * `n` - Number of indices to split
/// * `ratios` - Fraction of indices for each split
/// * `seed` - Random seed for reproducibility
pub fn split_indices(n: usize, ratios: &[f32], seed: Seed) -> Result<SplitIndices> {
    if !(2..=3).contains(&ratios.len()) {
        return Err(DataError::InvalidInput(format!(
            "expected 2 or 3 split ratios, got {}",
            ratios.len()
        )));
    }
    if ratios.iter().any(|&r| !(0.0..=1.0).contains(&r)) {
        return Err(DataError::InvalidInput(format!(
            "split ratios must be between 0 and 1, got {:?}",
            ratios
        )));
    }
    let total: f32 = ratios.iter().sum();
    if total > 1.0 + 1e-6 {
        return Err(DataError::InvalidInput(format!(
            "split ratios must sum to at most 1, got {}",
            total
        )));
    }

    let permutation = seed.permutation(n);
    let mut bounds = Vec::with_capacity(ratios.len() + 1);
    bounds.push(0);
    let mut cumulative = 0.0f64;
    for &ratio in ratios {
        // rounded to absorb f32 noise before flooring
        cumulative = ((cumulative + f64::from(ratio)) * 1e6).round() / 1e6;
        bounds.push(((cumulative * n as f64 + 1e-6).floor() as usize).min(n));
    }
    if (total - 1.0).abs() <= 1e-6 {
        if let Some(last) = bounds.last_mut() {
            *last = n;
        }
    }

    let mut parts = bounds.windows(2).map(|w| permutation[w[0]..w[1]].to_vec());
    let train = parts.next().unwrap_or_default();
    let valid = parts.next().unwrap_or_default();
    let test = parts.next().unwrap_or_default();

    tracing::debug!(
        "Split {} indices into {} train, {} valid, {} test",
        n,
        train.len(),
        valid.len(),
        test.len()
    );
    Ok(SplitIndices { train, valid, test })
}
