//! Error types for sitsgen_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur in sitsgen_core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid array shape provided.
    #[error("Invalid shape: expected {expected}, got {got}")]
    InvalidShape {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        got: String,
    },

    /// Generic error.
    #[error("{0}")]
    Other(String),
}
