//! Paired SAR and optical views of the same generated scenes.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3};

use crate::error::{DataError, Result};
use crate::product::{FrameDataset, ProductDataset};
use crate::tree::DatasetNode;

/// Subdirectory of a view holding its SAR product dataset.
pub const SAR_DIRNAME: &str = "sar";
/// Subdirectory of a view holding its optical product dataset.
pub const OPTICAL_DIRNAME: &str = "optical";

/// Matching SAR and optical frames over every view found under a root directory.
///
/// Each subdirectory of the root is one view, generated with its own seed,
/// and holds a `sar` and an `optical` product dataset. Views are visited in
/// name order and folded into one composite tree per modality, so index `i`
/// of both trees refers to the same scene at the same date.
#[derive(Debug)]
pub struct SarOpticalDataset {
    root: PathBuf,
    sar: DatasetNode,
    optical: DatasetNode,
    horizon: usize,
}

impl SarOpticalDataset {
    /// Load every view below `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if a view cannot be loaded, if `root` holds no view,
    /// or if the SAR and optical trees differ in length.
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let mut views = Vec::new();
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if path.is_dir() {
                views.push(path);
            }
        }
        views.sort();

        let mut sar_datasets = Vec::with_capacity(views.len());
        let mut optical_datasets = Vec::with_capacity(views.len());
        for view in &views {
            sar_datasets.push(ProductDataset::load(view.join(SAR_DIRNAME))?);
            optical_datasets.push(ProductDataset::load(view.join(OPTICAL_DIRNAME))?);
        }

        let horizon = optical_datasets.first().map(|d| d.len()).ok_or(DataError::EmptyDataset)?;

        let dataset = Self::new(
            DatasetNode::from_leaves(sar_datasets)?,
            DatasetNode::from_leaves(optical_datasets)?,
            horizon,
        )?;
        let dataset = Self {
            root: root.to_path_buf(),
            ..dataset
        };
        tracing::info!(
            "Loaded {} views ({} frames, horizon {}) from {}",
            views.len(),
            dataset.len(),
            horizon,
            root.display()
        );
        Ok(dataset)
    }

    /// Pair two already built trees.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidInput`] if the trees differ in length and
    /// [`DataError::InvalidShape`] if a view does not hold exactly `horizon`
    /// frames.
    pub fn new(sar: DatasetNode, optical: DatasetNode, horizon: usize) -> Result<Self> {
        if sar.len() != optical.len() {
            return Err(DataError::InvalidInput(format!(
                "Dataset lengths are not equal: {} SAR frames, {} optical frames",
                sar.len(),
                optical.len()
            )));
        }
        for (modality, tree) in [("SAR", &sar), ("optical", &optical)] {
            if let Some((view, leaf)) = tree.leaves().into_iter().enumerate().find(|(_, l)| l.len() != horizon) {
                return Err(DataError::InvalidShape(format!(
                    "{} view {} holds {} frames, expected a series of {}",
                    modality,
                    view,
                    leaf.len(),
                    horizon
                )));
            }
        }
        Ok(Self {
            root: PathBuf::new(),
            sar,
            optical,
            horizon,
        })
    }

    /// Root directory the views were loaded from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Length of the time series of a single view.
    #[must_use]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Number of frame pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.optical.len()
    }

    /// Check if the dataset holds no frame.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Composite tree of SAR views.
    #[must_use]
    pub fn sar_dataset(&self) -> &DatasetNode {
        &self.sar
    }

    /// Composite tree of optical views.
    #[must_use]
    pub fn optical_dataset(&self) -> &DatasetNode {
        &self.optical
    }

    /// Tree of clean frames generative models learn to produce, the optical one.
    #[must_use]
    pub fn target_dataset(&self) -> &DatasetNode {
        &self.optical
    }

    /// Mutable access to the target tree, to install transforms on its leaves.
    pub fn target_dataset_mut(&mut self) -> &mut DatasetNode {
        &mut self.optical
    }

    /// SAR frame, optical frame and optical annotation at `index`.
    pub fn get(&self, index: usize) -> Result<((Array3<f32>, Array3<f32>), Array2<i64>)> {
        let (sar, _) = self.sar.get(index)?;
        let (optical, annotation) = self.optical.get(index)?;
        Ok(((sar, optical), annotation))
    }
}
