//! Pixel time series arrays for classical classifiers.
//!
//! A drained loader holds `N` batches of `T` frames of `H x W` pixels with
//! `C` channels each. Every pixel of every batch becomes one sample row
//! whose features are its `T x C` values, time-major and channel-minor:
//! feature `t * C + c` is channel `c` at step `t`. Its label is the
//! annotation at step 0. Rows come out in `(n, h, w)` order before the
//! shuffle.

use ndarray::{Array1, Array2, Axis};

use sitsgen_core::{PixelShape, Seed, BACKGROUND_LABEL};
use sitsgen_data::{FrameBatch, FrameDataset, FrameLoader};

use crate::error::{Result, TrainError};

/// Flat feature matrix and aligned label vector.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelArrays {
    /// `(n_samples, T * C)` features.
    pub features: Array2<f32>,
    /// `(n_samples,)` labels.
    pub labels: Array1<i64>,
}

impl PixelArrays {
    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if there is no sample.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Keep only the first `n` samples. No-op if `n` exceeds the sample count.
    #[must_use]
    pub fn head(self, n: usize) -> Self {
        if n >= self.len() {
            return self;
        }
        Self {
            features: self.features.slice_axis(Axis(0), (0..n).into()).to_owned(),
            labels: self.labels.slice_axis(Axis(0), (0..n).into()).to_owned(),
        }
    }
}

/// Shape shared by every batch, checked against the first one.
fn batch_shape(batches: &[FrameBatch]) -> Result<PixelShape> {
    let first = batches
        .first()
        .ok_or_else(|| TrainError::ShapeMismatch("no batch to materialize".to_string()))?;
    let (t, h, w, c) = first.frames.dim();
    let shape = PixelShape::new(batches.len(), t, h, w, c);

    for (n, batch) in batches.iter().enumerate() {
        if !shape.accepts_batch(batch.frames.shape()) {
            return Err(TrainError::ShapeMismatch(format!(
                "batch {} has frames {:?}, expected {:?}",
                n,
                batch.frames.shape(),
                shape.batch_dims()
            )));
        }
        if batch.annotations.dim() != (t, h, w) {
            return Err(TrainError::ShapeMismatch(format!(
                "batch {} has annotations {:?}, expected {:?}",
                n,
                batch.annotations.shape(),
                [t, h, w]
            )));
        }
    }
    Ok(shape)
}

/// Flatten batches into pixel samples, shuffle them and drop background pixels.
///
/// Features and labels are permuted by the same seeded permutation, then
/// every row labeled [`BACKGROUND_LABEL`] is removed from both.
///
/// # Errors
///
/// Returns [`TrainError::ShapeMismatch`] if `batches` is empty or its
/// batches disagree in shape.
pub fn materialize(batches: &[FrameBatch], seed: Seed) -> Result<PixelArrays> {
    let shape = batch_shape(batches)?;
    let (h, w, c) = (shape.height(), shape.width(), shape.channels());
    let pixels_per_batch = h * w;

    let features = Array2::from_shape_fn((shape.n_pixels(), shape.n_features()), |(row, feature)| {
        let (n, pixel) = (row / pixels_per_batch, row % pixels_per_batch);
        let (t, channel) = (feature / c, feature % c);
        batches[n].frames[[t, pixel / w, pixel % w, channel]]
    });
    let labels = Array1::from_shape_fn(shape.n_pixels(), |row| {
        let (n, pixel) = (row / pixels_per_batch, row % pixels_per_batch);
        batches[n].annotations[[0, pixel / w, pixel % w]]
    });

    let permutation = seed.permutation(labels.len());
    let kept: Vec<usize> = permutation
        .into_iter()
        .filter(|&row| labels[row] != BACKGROUND_LABEL)
        .collect();

    let arrays = PixelArrays {
        features: features.select(Axis(0), &kept),
        labels: labels.select(Axis(0), &kept),
    };
    tracing::debug!(
        "Materialized {} foreground pixels out of {} from {} batches {}",
        arrays.len(),
        shape.n_pixels(),
        batches.len(),
        shape
    );
    Ok(arrays)
}

/// Drain `loader` and [`materialize`] its batches.
pub fn materialize_loader<D>(loader: &FrameLoader<'_, D>, seed: Seed) -> Result<PixelArrays>
where
    D: FrameDataset + ?Sized,
{
    let batches = loader.collect_batches()?;
    materialize(&batches, seed)
}
