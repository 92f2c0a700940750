//! # sitsgen
//!
//! Synthetic satellite image time series in Rust.
//!
//! sitsgen provides the data side of a toy satellite imagery generator and
//! the reference classifier used to score generated frames:
//!
//! - **Time series**: labeled multivariate series loaded from `.ts` files,
//!   preprocessed and randomly windowed
//! - **Composite datasets**: product dataset leaves folded into a tree, with
//!   transforms installed on every leaf at once
//! - **Reference classifier**: per-pixel time series flattened into feature
//!   matrices, a logistic regression fitted over memory-bounded chunks
//! - **Analysis**: accuracy and row-normalized confusion matrices
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sitsgen::prelude::*;
//!
//! // Labeled time series
//! let mut dataset = TSDataset::load_preprocessed("data/Crop_TRAIN.ts", &PreprocessConfig {
//!     ndim: Some(1),
//!     nclass: Some(4),
//!     rescale: true,
//! })?;
//! let mut rng = Seed::new(42).to_rng();
//! let serie = dataset.sample(Some(2), true, &mut rng)?;
//!
//! // Reference classifier over generated views
//! let config = PipelineConfig::load("configs/reference.json")?;
//! let mut experiment = Experiment::build(&config)?;
//! let report = run_reference_classifier(&mut experiment, &config, 4, "runs/reference")?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export all crates
pub use sitsgen_analysis as analysis;
pub use sitsgen_core as core;
pub use sitsgen_data as data;
pub use sitsgen_train as train;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use sitsgen::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use sitsgen_core::{
        normalize_frames, select_annotation_channel, LeafTransform, PixelShape, Seed, Split,
        BACKGROUND_LABEL,
    };

    // Data
    pub use sitsgen_data::{
        merge, propagate, split_indices, DatasetNode, FrameBatch, FrameDataset, FrameLoader,
        PreprocessConfig, ProductDataset, SarOpticalDataset, TSDataset, TimeSerie,
    };

    // Analysis
    pub use sitsgen_analysis::{confusion_matrix, ConfusionMatrix, NormalizedConfusion};

    // Training
    pub use sitsgen_train::{
        accuracy, confusion, evaluate, fit_by_chunks, materialize, materialize_loader,
        run_reference_classifier, Experiment, FitOutcome, LogisticRegression,
        LogisticRegressionConfig, PipelineConfig, PixelArrays, ReferenceClassifierConfig,
    };
}
