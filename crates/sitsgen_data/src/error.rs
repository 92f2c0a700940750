//! Error types for sitsgen_data.

use thiserror::Error;

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur in data operations.
///
/// Every variant is fatal to the operation that raised it: these signal
/// misconfiguration or malformed input, not conditions to retry.
#[derive(Error, Debug)]
pub enum DataError {
    /// Malformed labeled time series source.
    #[error("Load error at line {line}: {reason}")]
    Load {
        /// 1-based line number in the source (0 when not line specific).
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Datasets or arrays with incompatible dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Actual dimensionality.
        got: usize,
    },

    /// No series carries the requested label.
    #[error("No series with label {label}")]
    NoMatch {
        /// The requested label.
        label: i64,
    },

    /// Every series was already drawn once without replacement.
    #[error("All samples have already been drawn once")]
    Exhausted,

    /// Window horizon longer than the series it reads from.
    #[error("Horizon {horizon} exceeds series length {length}")]
    InvalidHorizon {
        /// Requested horizon.
        horizon: usize,
        /// Length of the underlying series.
        length: usize,
    },

    /// A dimension has zero range and cannot be min-max rescaled.
    #[error("Dimension {dim} is constant (value {value}), cannot rescale")]
    DegenerateDimension {
        /// Index of the constant dimension.
        dim: usize,
        /// Its constant value.
        value: f32,
    },

    /// Requested behaviour is deliberately unsupported.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Dataset is empty.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Index out of bounds.
    #[error("Index {index} out of bounds for length {length}")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The length of the collection.
        length: usize,
    },

    /// Batch size error.
    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(String),

    /// Invalid array shape.
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// File format error.
    #[error("File format error: {0}")]
    FormatError(String),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Core error.
    #[error("Core error: {0}")]
    CoreError(#[from] sitsgen_core::CoreError),
}

impl DataError {
    pub(crate) fn load(line: usize, reason: impl Into<String>) -> Self {
        Self::Load {
            line,
            reason: reason.into(),
        }
    }
}
