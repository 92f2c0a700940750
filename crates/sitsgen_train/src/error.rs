//! Error types for training.

use thiserror::Error;

/// Result type alias for training operations.
pub type Result<T> = std::result::Result<T, TrainError>;

/// Errors that can occur during training and evaluation.
///
/// Solver non-convergence is not an error: it is reported through
/// [`crate::FitOutcome`].
#[derive(Error, Debug)]
pub enum TrainError {
    /// Features, labels or batches whose shapes do not line up.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Classifier used before any fit.
    #[error("Classifier has not been fitted yet")]
    NotFitted,

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Training data the solver cannot work with.
    #[error("Invalid training data: {0}")]
    InvalidData(String),

    /// Worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Data error.
    #[error("Data error: {0}")]
    DataError(#[from] sitsgen_data::DataError),

    /// Core error.
    #[error("Core error: {0}")]
    CoreError(#[from] sitsgen_core::CoreError),

    /// Artifact could not be written or read back.
    #[error("Artifact error: {0}")]
    ArtifactError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
