//! # sitsgen_core
//!
//! Core types shared by the sitsgen crates.
//!
//! This crate provides:
//! - [`Seed`] for deterministic random number generation
//! - [`Split`] to name the train/valid/test subsets of an experiment
//! - [`PixelShape`] for the `(N, T, H, W, C)` layout of stacked frame batches
//! - [`FrameTransform`] and [`AnnotationTransform`] installed on dataset leaves
//! - Error types and common utilities
//!
//! ## Shape Convention
//!
//! Frame batches follow the convention `(N, T, H, W, C)`:
//! - `N`: Number of batches (one time series window each)
//! - `T`: Horizon (time steps)
//! - `H`, `W`: Spatial extent
//! - `C`: Channels
//!
//! ## Example
//!
//! ```rust,ignore
//! use sitsgen_core::{PixelShape, Seed};
//!
//! let seed = Seed::new(42);
//! let shape = PixelShape::new(4, 3, 32, 32, 2);
//! assert_eq!(shape.n_features(), 6);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod seed;
mod shape;
mod split;
mod transform;

pub use error::{CoreError, Result};
pub use seed::Seed;
pub use shape::PixelShape;
pub use split::Split;
pub use transform::{
    normalize_frames, select_annotation_channel, AnnotationTransform, FrameTransform,
    LeafTransform, TransformSlot,
};

/// Label reserved for background pixels.
pub const BACKGROUND_LABEL: i64 = 0;
