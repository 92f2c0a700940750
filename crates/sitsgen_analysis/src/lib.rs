//! # sitsgen_analysis
//!
//! Classification analysis for sitsgen: confusion matrices over ordered
//! class labels, raw counts or row-normalized, and their heatmap images.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod confusion;
mod heatmap;

pub use confusion::{confusion_matrix, ConfusionMatrix, NormalizedConfusion};
pub use heatmap::{interpolate_color, HeatmapConfig};
