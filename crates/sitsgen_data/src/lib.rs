//! # sitsgen_data
//!
//! Datasets and loaders for synthetic satellite image time series.
//!
//! This crate provides:
//! - [`TimeSerie`] and [`TSDataset`] for labeled multivariate series, with
//!   preprocessing and random sampling
//! - [`ProductDataset`] leaves holding the frames of one generated view
//! - [`DatasetNode`] composite trees aggregating many views, and
//!   [`propagate`] to install transforms on every leaf
//! - [`FrameLoader`] for batched iteration over an index subset
//! - [`SarOpticalDataset`] pairing SAR and optical views
//!
//! ## Example
//!
//! ```rust,ignore
//! use sitsgen_core::{normalize_frames, LeafTransform, Seed};
//! use sitsgen_data::{propagate, FrameLoader, SarOpticalDataset};
//!
//! let mut dataset = SarOpticalDataset::load("data/toy")?;
//! let horizon = dataset.horizon();
//! propagate(dataset.target_dataset_mut(), &LeafTransform::Frame(normalize_frames(0.5, 0.5)));
//!
//! let loader = FrameLoader::builder(dataset.target_dataset())
//!     .batch_size(horizon)
//!     .build()?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod dataset;
mod error;
mod io;
mod loader;
mod paired;
mod product;
mod sampler;
mod splits;
mod timeserie;
mod tree;
pub mod tsfile;

pub use dataset::{merge, PreprocessConfig, TSDataset};
pub use error::{DataError, Result};
pub use io::{read_annotations_npy, read_frames_npy, write_npy4};
pub use loader::{FrameBatch, FrameLoader, FrameLoaderBuilder, FrameLoaderIter};
pub use paired::{SarOpticalDataset, OPTICAL_DIRNAME, SAR_DIRNAME};
pub use product::{FrameDataset, ProductDataset, ANNOTATIONS_FILE, FRAMES_FILE};
pub use splits::{split_indices, SplitIndices};
pub use timeserie::{TimeSerie, Window};
pub use tree::{propagate, DatasetNode};
pub use tsfile::{load_ts_file, parse_ts_str, TsTable};
