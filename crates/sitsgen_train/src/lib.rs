//! # sitsgen_train
//!
//! Reference pixel classifier for synthetic satellite image time series.
//!
//! This crate provides:
//! - [`materialize`] to turn batches of frames into flat pixel arrays
//! - [`LogisticRegression`], a warm-startable multinomial classifier
//! - [`fit_by_chunks`] to fit it over memory-bounded row chunks
//! - [`evaluate`], [`accuracy`] and [`confusion`] on held-out pixels
//! - [`PipelineConfig`], [`Experiment`] and [`run_reference_classifier`]
//!   for the end-to-end run and its artifacts
//!
//! ## Example
//!
//! ```rust,ignore
//! use sitsgen_train::{run_reference_classifier, Experiment, PipelineConfig};
//!
//! let config = PipelineConfig::load("configs/reference.json")?;
//! let mut experiment = Experiment::build(&config)?;
//! let report = run_reference_classifier(&mut experiment, &config, 4, "out")?;
//! println!("accuracy: {:.3}", report.accuracy);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunked;
pub mod classifier;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod experiment;
pub mod export;
pub mod pixels;

pub use chunked::{chunk_bounds, fit_by_chunks, ChunkedFit};
pub use classifier::{FitOutcome, LogisticRegression, LogisticRegressionConfig};
pub use config::{DatasetConfig, ExperimentConfig, PipelineConfig, ReferenceClassifierConfig};
pub use error::{Result, TrainError};
pub use evaluation::{accuracy, confusion, evaluate, EvaluationResult};
pub use experiment::{run_reference_classifier, Experiment, ReferenceReport, Subset};
pub use pixels::{materialize, materialize_loader, PixelArrays};
