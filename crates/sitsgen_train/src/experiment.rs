//! Experiment subsets and the reference classifier pipeline.
//!
//! The paired dataset is split by whole time series: every view contributes
//! blocks of `horizon` consecutive frames, and a block goes entirely to one
//! subset. Loaders with `batch_size = horizon` over a subset then yield one
//! complete series per batch.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use sitsgen_core::{normalize_frames, select_annotation_channel, LeafTransform, Seed, Split};
use sitsgen_data::{split_indices, FrameLoader, SarOpticalDataset, SplitIndices};

use crate::chunked::fit_by_chunks;
use crate::config::PipelineConfig;
use crate::error::{Result, TrainError};
use crate::evaluation::evaluate;
use crate::export::{save_accuracy, save_classifier, save_confusion};
use crate::pixels::{materialize_loader, PixelArrays};

/// Frame normalization mean of the reference pipeline.
pub const FRAME_MEAN: f32 = 0.5;
/// Frame normalization standard deviation of the reference pipeline.
pub const FRAME_STD: f32 = 0.5;
/// Annotation mask channel holding the land cover labels.
pub const LABEL_CHANNEL: usize = 1;

/// Frame indices of one experiment subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subset {
    /// Which subset this is.
    pub split: Split,
    /// Frame indices into the paired dataset, series after series.
    pub indices: Vec<usize>,
}

impl Subset {
    /// Number of frames.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check if the subset holds no frame.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A paired dataset with its train, validation and test subsets.
#[derive(Debug)]
pub struct Experiment {
    /// The paired SAR and optical frames.
    pub dataset: SarOpticalDataset,
    /// Training frames.
    pub train_set: Subset,
    /// Validation frames.
    pub val_set: Subset,
    /// Test frames, empty for two-way splits.
    pub test_set: Subset,
}

impl Experiment {
    /// Create an experiment from a split of the dataset's series indices.
    ///
    /// Series `s` covers frames `s * horizon .. (s + 1) * horizon`.
    ///
    /// # Errors
    ///
    /// [`TrainError::InvalidData`] if the horizon is zero, the frame count
    /// is not a multiple of it, or a series index is out of range.
    pub fn new(dataset: SarOpticalDataset, series: SplitIndices) -> Result<Self> {
        let n_series = count_series(&dataset)?;
        let horizon = dataset.horizon();
        let expand = |split: Split| -> Result<Subset> {
            let mut indices = Vec::with_capacity(series.get(split).len() * horizon);
            for &s in series.get(split) {
                if s >= n_series {
                    return Err(TrainError::InvalidData(format!(
                        "series {} out of range for {} series",
                        s, n_series
                    )));
                }
                indices.extend(s * horizon..(s + 1) * horizon);
            }
            Ok(Subset { split, indices })
        };

        Ok(Self {
            train_set: expand(Split::Train)?,
            val_set: expand(Split::Valid)?,
            test_set: expand(Split::Test)?,
            dataset,
        })
    }

    /// Load the dataset under `config.dataset.root` and split its series
    /// with the experiment seed and ratios.
    pub fn build(config: &PipelineConfig) -> Result<Self> {
        config.experiment.validate()?;
        let dataset = SarOpticalDataset::load(&config.dataset.root)?;
        let n_series = count_series(&dataset)?;
        let series = split_indices(n_series, &config.experiment.split, Seed::new(config.experiment.seed))?;
        let experiment = Self::new(dataset, series)?;
        tracing::info!(
            "Experiment over {} series of {} frames: {} train, {} valid, {} test frames",
            n_series,
            experiment.dataset.horizon(),
            experiment.train_set.len(),
            experiment.val_set.len(),
            experiment.test_set.len()
        );
        Ok(experiment)
    }

    /// Subset of `split`.
    pub fn subset(&self, split: Split) -> &Subset {
        match split {
            Split::Train => &self.train_set,
            Split::Valid => &self.val_set,
            Split::Test => &self.test_set,
        }
    }

    /// Materialize the target frames of `split` into shuffled pixel arrays.
    pub fn pixel_arrays(&self, split: Split, seed: Seed) -> Result<PixelArrays> {
        let loader = FrameLoader::builder(self.dataset.target_dataset())
            .batch_size(self.dataset.horizon())
            .indices(self.subset(split).indices.clone())
            .build()?;
        materialize_loader(&loader, seed)
    }
}

fn count_series(dataset: &SarOpticalDataset) -> Result<usize> {
    let horizon = dataset.horizon();
    if horizon == 0 || dataset.len() % horizon != 0 {
        return Err(TrainError::InvalidData(format!(
            "{} frames do not form series of horizon {}",
            dataset.len(),
            horizon
        )));
    }
    Ok(dataset.len() / horizon)
}

/// Outcome of [`run_reference_classifier`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceReport {
    /// Validation accuracy.
    pub accuracy: f64,
    /// Training rows fitted on.
    pub n_train: usize,
    /// Validation rows scored.
    pub n_valid: usize,
    /// Chunk fits that did not converge.
    pub n_not_converged: usize,
    /// Written artifacts.
    pub artifacts: Vec<PathBuf>,
}

/// Fit and evaluate the reference pixel classifier, writing artifacts to `out_dir`.
///
/// Installs `(x - 0.5) / 0.5` frame normalization and annotation channel
/// selection on every leaf of the target tree, materializes the train and
/// validation subsets, caps the training rows at `train_set_size`, fits by
/// chunks, then saves the classifier, its validation accuracy and the
/// normalized confusion matrix with its heatmap.
pub fn run_reference_classifier(
    experiment: &mut Experiment,
    config: &PipelineConfig,
    n_jobs: usize,
    out_dir: impl AsRef<Path>,
) -> Result<ReferenceReport> {
    config.validate()?;
    let out_dir = out_dir.as_ref();
    let seed = Seed::new(config.experiment.seed);

    let target = experiment.dataset.target_dataset_mut();
    target.propagate(&LeafTransform::Frame(normalize_frames(FRAME_MEAN, FRAME_STD)));
    target.propagate(&LeafTransform::Annotation(select_annotation_channel(LABEL_CHANNEL)));

    let mut train = experiment.pixel_arrays(Split::Train, seed.derive("train"))?;
    let valid = experiment.pixel_arrays(Split::Valid, seed.derive("valid"))?;
    if let Some(size) = config.reference_classifier.train_set_size {
        train = train.head(size);
    }
    tracing::info!("Training on {} pixels, validating on {}", train.len(), valid.len());

    let fit = fit_by_chunks(
        train.features.view(),
        train.labels.view(),
        &config.reference_classifier,
        n_jobs,
    )?;
    let evaluation = evaluate(valid.features.view(), valid.labels.view(), &fit.classifier)?;
    tracing::info!("Validation accuracy: {:.4}", evaluation.accuracy);

    let mut artifacts = vec![
        save_classifier(&fit.classifier, out_dir)?,
        save_accuracy(evaluation.accuracy, out_dir)?,
    ];
    artifacts.extend(save_confusion(&evaluation.normalized_confusion(), out_dir)?.into_paths());
    tracing::info!("Wrote {} artifacts to {}", artifacts.len(), out_dir.display());

    Ok(ReferenceReport {
        accuracy: evaluation.accuracy,
        n_train: train.len(),
        n_valid: valid.len(),
        n_not_converged: fit.n_not_converged(),
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;
    use sitsgen_data::{DatasetNode, ProductDataset, OPTICAL_DIRNAME, SAR_DIRNAME};

    fn toy_dataset(n_views: usize, horizon: usize) -> SarOpticalDataset {
        let leaves = |value: f32| {
            (0..n_views).map(move |_| {
                let frames = Array4::from_elem((horizon, 2, 2, 1), value);
                ProductDataset::new(frames, Array4::ones((horizon, 2, 2, 2))).unwrap()
            })
        };
        let sar = DatasetNode::from_leaves(leaves(0.0)).unwrap();
        let optical = DatasetNode::from_leaves(leaves(1.0)).unwrap();
        SarOpticalDataset::new(sar, optical, horizon).unwrap()
    }

    #[test]
    fn test_series_blocks() {
        let series = SplitIndices {
            train: vec![2, 0],
            valid: vec![1],
            test: vec![],
        };
        let experiment = Experiment::new(toy_dataset(3, 4), series).unwrap();
        assert_eq!(experiment.train_set.indices, vec![8, 9, 10, 11, 0, 1, 2, 3]);
        assert_eq!(experiment.val_set.indices, vec![4, 5, 6, 7]);
        assert!(experiment.test_set.is_empty());
        assert_eq!(experiment.subset(Split::Valid).split, Split::Valid);
    }

    #[test]
    fn test_series_out_of_range() {
        let series = SplitIndices {
            train: vec![3],
            ..SplitIndices::default()
        };
        assert!(matches!(
            Experiment::new(toy_dataset(3, 4), series),
            Err(TrainError::InvalidData(_))
        ));
    }

    #[test]
    fn test_build_from_config() {
        let dir = tempfile::tempdir().unwrap();
        for view in 0..5 {
            let view_dir = dir.path().join(format!("view_{}", view));
            for name in [SAR_DIRNAME, OPTICAL_DIRNAME] {
                ProductDataset::new(Array4::zeros((3, 2, 2, 1)), Array4::ones((3, 2, 2, 2)))
                    .unwrap()
                    .save(view_dir.join(name))
                    .unwrap();
            }
        }
        let mut config = PipelineConfig::default();
        config.dataset.root = dir.path().to_path_buf();
        config.experiment.split = vec![0.6, 0.4];

        let experiment = Experiment::build(&config).unwrap();
        assert_eq!(experiment.train_set.len(), 9);
        assert_eq!(experiment.val_set.len(), 6);
        assert!(experiment.test_set.is_empty());
        for subset in [&experiment.train_set, &experiment.val_set] {
            for block in subset.indices.chunks(3) {
                assert_eq!(block[0] % 3, 0);
                assert_eq!(block[2], block[0] + 2);
            }
        }
    }
}
