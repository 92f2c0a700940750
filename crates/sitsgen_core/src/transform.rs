//! Transforms installed on dataset leaves.
//!
//! Leaves of a composite dataset expose two fixed slots, one for frames and
//! one for annotation masks. A [`LeafTransform`] carries the function and,
//! through its variant, the slot it belongs to.

use std::fmt;
use std::sync::Arc;

use ndarray::{Array2, Array3, ArrayView3, Axis};

use crate::error::{CoreError, Result};

/// Transform applied to a single `(H, W, C)` frame.
///
/// Transforms return `Result` instead of panicking.
pub type FrameTransform = Arc<dyn Fn(Array3<f32>) -> Result<Array3<f32>> + Send + Sync>;

/// Transform turning a raw `(H, W, K)` annotation mask into a `(H, W)` label map.
pub type AnnotationTransform = Arc<dyn Fn(ArrayView3<'_, i64>) -> Result<Array2<i64>> + Send + Sync>;

/// The fixed transform slots of a dataset leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformSlot {
    /// Applied to every frame read from the leaf.
    Frame,
    /// Applied to every annotation mask read from the leaf.
    Annotation,
}

impl TransformSlot {
    /// Field name of the slot.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            TransformSlot::Frame => "frame_transform",
            TransformSlot::Annotation => "annotation_transform",
        }
    }
}

impl fmt::Display for TransformSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A transform together with the slot it is installed into.
#[derive(Clone)]
pub enum LeafTransform {
    /// Goes into the frame slot.
    Frame(FrameTransform),
    /// Goes into the annotation slot.
    Annotation(AnnotationTransform),
}

impl LeafTransform {
    /// Slot this transform targets.
    #[must_use]
    pub fn slot(&self) -> TransformSlot {
        match self {
            LeafTransform::Frame(_) => TransformSlot::Frame,
            LeafTransform::Annotation(_) => TransformSlot::Annotation,
        }
    }
}

impl fmt::Debug for LeafTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LeafTransform").field(&self.slot()).finish()
    }
}

/// Affine frame normalization `(x - mean) / std`.
///
/// With `mean = 0.5, std = 0.5` this maps `[0, 1]` reflectances onto `[-1, 1]`,
/// the range generative models are trained on.
///
/// # Example
///
/// ```rust
/// use ndarray::Array3;
/// use sitsgen_core::normalize_frames;
///
/// let t = normalize_frames(0.5, 0.5);
/// let out = t(Array3::from_elem((1, 1, 1), 1.0)).unwrap();
/// assert_eq!(out[[0, 0, 0]], 1.0);
/// ```
#[must_use]
pub fn normalize_frames(mean: f32, std: f32) -> FrameTransform {
    Arc::new(move |frame: Array3<f32>| {
        if std == 0.0 {
            return Err(CoreError::Other("normalization std must be non-zero".to_string()));
        }
        Ok(frame.mapv_into(|x| (x - mean) / std))
    })
}

/// Keeps a single channel of a `(H, W, K)` annotation mask.
#[must_use]
pub fn select_annotation_channel(channel: usize) -> AnnotationTransform {
    Arc::new(move |mask: ArrayView3<'_, i64>| {
        let n_channels = mask.len_of(Axis(2));
        if channel >= n_channels {
            return Err(CoreError::InvalidShape {
                expected: format!("annotation mask with more than {} channels", channel),
                got: format!("{:?}", mask.shape()),
            });
        }
        Ok(mask.index_axis(Axis(2), channel).to_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_frames() {
        let t = normalize_frames(0.5, 0.5);
        let frame = Array3::from_shape_vec((1, 1, 3), vec![0.0, 0.5, 1.0]).unwrap();
        let out = t(frame).unwrap();
        assert_eq!(out.into_raw_vec(), vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_normalize_zero_std_fails() {
        let t = normalize_frames(0.0, 0.0);
        assert!(t(Array3::zeros((1, 1, 1))).is_err());
    }

    #[test]
    fn test_select_annotation_channel() {
        let mask = Array3::from_shape_fn((2, 2, 2), |(i, j, k)| (i * 10 + j) as i64 * (k as i64 + 1));
        let t = select_annotation_channel(1);
        let out = t(mask.view()).unwrap();
        assert_eq!(out[[1, 1]], 22);
        assert_eq!(out.shape(), &[2, 2]);

        let missing = select_annotation_channel(2);
        assert!(missing(mask.view()).is_err());
    }

    #[test]
    fn test_leaf_transform_slot() {
        let frame = LeafTransform::Frame(normalize_frames(0.5, 0.5));
        let annot = LeafTransform::Annotation(select_annotation_channel(0));
        assert_eq!(frame.slot(), TransformSlot::Frame);
        assert_eq!(annot.slot().name(), "annotation_transform");
    }
}
