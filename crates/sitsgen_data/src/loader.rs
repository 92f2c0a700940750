//! Batched iteration over frame datasets.

use ndarray::{Array3, Array4, Axis};

use crate::error::{DataError, Result};
use crate::product::FrameDataset;

/// A batch of consecutive frames with their label maps.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBatch {
    /// Frames of shape `(B, H, W, C)`.
    pub frames: Array4<f32>,
    /// Label maps of shape `(B, H, W)`.
    pub annotations: Array3<i64>,
}

impl FrameBatch {
    /// Number of frames in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len_of(Axis(0))
    }

    /// Check if the batch holds no frame.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A loader producing [`FrameBatch`]es from a subset of a frame dataset.
///
/// Batches follow the order of the index subset; there is no shuffling.
/// With the batch size set to the series horizon, each batch is one
/// complete time series of frames.
///
/// # Example
///
/// ```rust,ignore
/// use sitsgen_data::{FrameLoader, ProductDataset};
///
/// let dataset = ProductDataset::load("views/0/optical")?;
/// let loader = FrameLoader::builder(&dataset)
///     .batch_size(12)
///     .indices((0..48).collect())
///     .build()?;
///
/// for batch in loader.iter() {
///     let batch = batch?;
/// }
/// ```
pub struct FrameLoader<'a, D: FrameDataset + ?Sized> {
    dataset: &'a D,
    indices: Vec<usize>,
    batch_size: usize,
    drop_last: bool,
}

impl<'a, D: FrameDataset + ?Sized> FrameLoader<'a, D> {
    /// Create a new loader builder.
    #[must_use]
    pub fn builder(dataset: &'a D) -> FrameLoaderBuilder<'a, D> {
        FrameLoaderBuilder::new(dataset)
    }

    /// Get the batch size.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Indices of the dataset this loader visits.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Get the number of batches.
    #[must_use]
    pub fn n_batches(&self) -> usize {
        let n = self.indices.len();
        if self.drop_last {
            n / self.batch_size
        } else {
            (n + self.batch_size - 1) / self.batch_size
        }
    }

    /// Get the total number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check if the loader is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Create an iterator over batches.
    #[must_use]
    pub fn iter(&self) -> FrameLoaderIter<'_, 'a, D> {
        FrameLoaderIter {
            loader: self,
            current_batch: 0,
            n_batches: self.n_batches(),
        }
    }

    /// Drain every batch into memory.
    pub fn collect_batches(&self) -> Result<Vec<FrameBatch>> {
        self.iter().collect()
    }

    fn create_batch(&self, indices: &[usize]) -> Result<FrameBatch> {
        let mut items = indices.iter().map(|&idx| self.dataset.get(idx));
        let (first_frame, first_annotation) = match items.next() {
            Some(item) => item?,
            None => return Err(DataError::EmptyDataset),
        };

        let (h, w, c) = first_frame.dim();
        if first_annotation.dim() != (h, w) {
            return Err(DataError::InvalidShape(format!(
                "annotation {:?} does not match frame {:?}",
                first_annotation.shape(),
                first_frame.shape()
            )));
        }

        let mut frames = Array4::<f32>::zeros((indices.len(), h, w, c));
        let mut annotations = Array3::<i64>::zeros((indices.len(), h, w));
        frames.index_axis_mut(Axis(0), 0).assign(&first_frame);
        annotations.index_axis_mut(Axis(0), 0).assign(&first_annotation);

        for (i, item) in items.enumerate() {
            let (frame, annotation) = item?;
            if frame.dim() != (h, w, c) || annotation.dim() != (h, w) {
                return Err(DataError::InvalidShape(format!(
                    "frame {:?} with annotation {:?} in a batch of {:?} frames",
                    frame.shape(),
                    annotation.shape(),
                    (h, w, c)
                )));
            }
            frames.index_axis_mut(Axis(0), i + 1).assign(&frame);
            annotations.index_axis_mut(Axis(0), i + 1).assign(&annotation);
        }

        Ok(FrameBatch { frames, annotations })
    }
}

/// Builder for [`FrameLoader`].
pub struct FrameLoaderBuilder<'a, D: FrameDataset + ?Sized> {
    dataset: &'a D,
    indices: Option<Vec<usize>>,
    batch_size: usize,
    drop_last: bool,
}

impl<'a, D: FrameDataset + ?Sized> FrameLoaderBuilder<'a, D> {
    /// Create a new builder visiting the whole dataset one frame at a time.
    #[must_use]
    pub fn new(dataset: &'a D) -> Self {
        Self {
            dataset,
            indices: None,
            batch_size: 1,
            drop_last: false,
        }
    }

    /// Set the batch size.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Restrict the loader to these dataset indices, visited in order.
    #[must_use]
    pub fn indices(mut self, indices: Vec<usize>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Enable or disable dropping the last incomplete batch.
    #[must_use]
    pub fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    /// Build the loader.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch size is zero, the index subset is empty
    /// or an index falls outside the dataset.
    pub fn build(self) -> Result<FrameLoader<'a, D>> {
        if self.batch_size == 0 {
            return Err(DataError::InvalidBatchSize(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        let length = self.dataset.len();
        let indices = self.indices.unwrap_or_else(|| (0..length).collect());
        if indices.is_empty() {
            return Err(DataError::EmptyDataset);
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= length) {
            return Err(DataError::IndexOutOfBounds { index, length });
        }

        Ok(FrameLoader {
            dataset: self.dataset,
            indices,
            batch_size: self.batch_size,
            drop_last: self.drop_last,
        })
    }
}

/// Iterator over batches from a [`FrameLoader`].
pub struct FrameLoaderIter<'l, 'a, D: FrameDataset + ?Sized> {
    loader: &'l FrameLoader<'a, D>,
    current_batch: usize,
    n_batches: usize,
}

impl<'l, 'a, D: FrameDataset + ?Sized> Iterator for FrameLoaderIter<'l, 'a, D> {
    type Item = Result<FrameBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_batch >= self.n_batches {
            return None;
        }

        let start = self.current_batch * self.loader.batch_size;
        let end = (start + self.loader.batch_size).min(self.loader.indices.len());
        self.current_batch += 1;

        Some(self.loader.create_batch(&self.loader.indices[start..end]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.n_batches - self.current_batch;
        (remaining, Some(remaining))
    }
}

impl<'l, 'a, D: FrameDataset + ?Sized> ExactSizeIterator for FrameLoaderIter<'l, 'a, D> {}
