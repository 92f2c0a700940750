//! Product datasets: the frames and annotation masks of one generated view.

use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3, Array4, Axis};

use sitsgen_core::{AnnotationTransform, FrameTransform, LeafTransform};

use crate::error::{DataError, Result};
use crate::io::{read_annotations_npy, read_frames_npy, write_npy4};

/// File holding the `(T, H, W, C)` frames of a product dataset.
pub const FRAMES_FILE: &str = "frames.npy";
/// File holding the `(T, H, W, K)` annotation masks of a product dataset.
pub const ANNOTATIONS_FILE: &str = "annotations.npy";

/// Indexed access to `(frame, annotation)` pairs.
///
/// Frames are `(H, W, C)` and annotations `(H, W)` label maps, both already
/// passed through whatever transforms the dataset applies.
pub trait FrameDataset {
    /// Number of frames.
    fn len(&self) -> usize;

    /// Check if the dataset holds no frames.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frame and annotation at `index`.
    fn get(&self, index: usize) -> Result<(Array3<f32>, Array2<i64>)>;
}

/// Leaf dataset holding one view's time-ordered frames and annotation masks.
///
/// Exposes two transform slots read on every access: `frame_transform`
/// maps a raw `(H, W, C)` frame and `annotation_transform` reduces a raw
/// `(H, W, K)` mask to a `(H, W)` label map. Without an annotation
/// transform, mask channel 0 is used.
#[derive(Clone)]
pub struct ProductDataset {
    root: Option<PathBuf>,
    frames: Array4<f32>,
    annotations: Array4<i64>,
    frame_transform: Option<FrameTransform>,
    annotation_transform: Option<AnnotationTransform>,
}

impl ProductDataset {
    /// Create a product dataset from `(T, H, W, C)` frames and `(T, H, W, K)` masks.
    ///
    /// # Errors
    ///
    /// Returns an error if frames and masks disagree on `T`, `H` or `W`, or
    /// if masks have no channel.
    pub fn new(frames: Array4<f32>, annotations: Array4<i64>) -> Result<Self> {
        if frames.shape()[..3] != annotations.shape()[..3] {
            return Err(DataError::InvalidShape(format!(
                "frames {:?} and annotations {:?} differ in (T, H, W)",
                frames.shape(),
                annotations.shape()
            )));
        }
        if annotations.len_of(Axis(3)) == 0 {
            return Err(DataError::InvalidShape("annotation masks have no channel".to_string()));
        }
        Ok(Self {
            root: None,
            frames,
            annotations,
            frame_transform: None,
            annotation_transform: None,
        })
    }

    /// Frameless dataset, allocation free.
    pub(crate) fn placeholder() -> Self {
        Self {
            root: None,
            frames: Array4::zeros((0, 0, 0, 0)),
            annotations: Array4::zeros((0, 0, 0, 0)),
            frame_transform: None,
            annotation_transform: None,
        }
    }

    /// Load a product dataset from a directory holding [`FRAMES_FILE`] and [`ANNOTATIONS_FILE`].
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let frames = read_frames_npy(dir.join(FRAMES_FILE))?;
        let annotations = read_annotations_npy(dir.join(ANNOTATIONS_FILE))?;
        let mut dataset = Self::new(frames, annotations)?;
        dataset.root = Some(dir.to_path_buf());
        tracing::debug!("Loaded product dataset of {} frames from {}", dataset.len(), dir.display());
        Ok(dataset)
    }

    /// Write frames and masks into `dir`, readable back with [`ProductDataset::load`].
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        write_npy4(dir.join(FRAMES_FILE), &self.frames)?;
        write_npy4(dir.join(ANNOTATIONS_FILE), &self.annotations)
    }

    /// Source directory, if loaded from disk.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// `(H, W, C)` of a raw frame.
    #[must_use]
    pub fn frame_shape(&self) -> (usize, usize, usize) {
        let s = self.frames.shape();
        (s[1], s[2], s[3])
    }

    /// Install a transform into the slot it targets, replacing any previous one.
    pub fn set_transform(&mut self, transform: LeafTransform) {
        match transform {
            LeafTransform::Frame(t) => self.frame_transform = Some(t),
            LeafTransform::Annotation(t) => self.annotation_transform = Some(t),
        }
    }

    /// Installed frame transform.
    #[must_use]
    pub fn frame_transform(&self) -> Option<&FrameTransform> {
        self.frame_transform.as_ref()
    }

    /// Installed annotation transform.
    #[must_use]
    pub fn annotation_transform(&self) -> Option<&AnnotationTransform> {
        self.annotation_transform.as_ref()
    }
}

impl FrameDataset for ProductDataset {
    fn len(&self) -> usize {
        self.frames.len_of(Axis(0))
    }

    fn get(&self, index: usize) -> Result<(Array3<f32>, Array2<i64>)> {
        if index >= self.len() {
            return Err(DataError::IndexOutOfBounds {
                index,
                length: self.len(),
            });
        }

        let frame = self.frames.index_axis(Axis(0), index).to_owned();
        let frame = match &self.frame_transform {
            Some(transform) => transform(frame)?,
            None => frame,
        };

        let mask = self.annotations.index_axis(Axis(0), index);
        let annotation = match &self.annotation_transform {
            Some(transform) => transform(mask)?,
            None => mask.index_axis(Axis(2), 0).to_owned(),
        };

        Ok((frame, annotation))
    }
}

impl fmt::Debug for ProductDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductDataset")
            .field("root", &self.root)
            .field("frames", &self.frames.shape())
            .field("annotations", &self.annotations.shape())
            .field("frame_transform", &self.frame_transform.is_some())
            .field("annotation_transform", &self.annotation_transform.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitsgen_core::{normalize_frames, select_annotation_channel};

    fn toy_product(n_frames: usize, offset: f32) -> ProductDataset {
        let frames = Array4::from_shape_fn((n_frames, 2, 2, 1), |(t, i, j, _)| offset + (t * 4 + i * 2 + j) as f32);
        let annotations = Array4::from_shape_fn((n_frames, 2, 2, 2), |(t, i, _, k)| (t + i + k) as i64);
        ProductDataset::new(frames, annotations).unwrap()
    }

    #[test]
    fn test_shape_validation() {
        let frames = Array4::<f32>::zeros((3, 2, 2, 1));
        assert!(ProductDataset::new(frames.clone(), Array4::zeros((2, 2, 2, 1))).is_err());
        assert!(ProductDataset::new(frames, Array4::zeros((3, 2, 2, 0))).is_err());
    }

    #[test]
    fn test_get_without_transforms() {
        let ds = toy_product(3, 0.0);
        let (frame, annotation) = ds.get(1).unwrap();
        assert_eq!(frame.shape(), &[2, 2, 1]);
        assert_eq!(frame[[1, 1, 0]], 7.0);
        assert_eq!(annotation[[1, 0]], 2);
        assert!(ds.get(3).is_err());
    }

    #[test]
    fn test_get_with_transforms() {
        let mut ds = toy_product(2, 0.0);
        ds.set_transform(LeafTransform::Frame(normalize_frames(0.0, 2.0)));
        ds.set_transform(LeafTransform::Annotation(select_annotation_channel(1)));
        let (frame, annotation) = ds.get(1).unwrap();
        assert_eq!(frame[[0, 1, 0]], 2.5);
        assert_eq!(annotation[[0, 0]], 2);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let ds = toy_product(4, 1.0);
        ds.save(dir.path()).unwrap();
        let loaded = ProductDataset::load(dir.path()).unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.frame_shape(), (2, 2, 1));
        assert_eq!(loaded.get(2).unwrap(), ds.get(2).unwrap());
        assert_eq!(loaded.root(), Some(dir.path()));
    }
}
