//! Pipeline configuration.
//!
//! Configurations are JSON documents:
//!
//! ```json
//! {
//!   "experiment": { "seed": 73, "split": [0.7, 0.15, 0.15] },
//!   "dataset": { "root": "data/toy_sar_to_optical" },
//!   "reference_classifier": {
//!     "train_set_size": 100000,
//!     "l2_weight": 0.01,
//!     "n_chunks": 10,
//!     "tol": 0.001,
//!     "seed": 73
//!   }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainError};

/// Experiment-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Seed of the index split and of the pixel shuffle.
    pub seed: u64,
    /// Train, validation and optional test fractions.
    pub split: Vec<f32>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            split: vec![0.7, 0.15, 0.15],
        }
    }
}

/// Location of the generated views.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Directory holding one subdirectory per view.
    pub root: PathBuf,
}

/// Hyperparameters of the reference pixel classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceClassifierConfig {
    /// Cap on the number of training rows, all rows when unset.
    #[serde(default)]
    pub train_set_size: Option<usize>,
    /// Inverse L2 regularization strength.
    pub l2_weight: f64,
    /// Number of chunks the training rows are fitted in.
    pub n_chunks: usize,
    /// Solver tolerance on the relative weight change per epoch.
    pub tol: f64,
    /// Seed of the solver sample order.
    pub seed: u64,
    /// Maximum solver epochs per chunk.
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
}

fn default_max_iter() -> usize {
    1000
}

impl Default for ReferenceClassifierConfig {
    fn default() -> Self {
        Self {
            train_set_size: None,
            l2_weight: 1.0,
            n_chunks: 1,
            tol: 1e-4,
            seed: 42,
            max_iter: default_max_iter(),
        }
    }
}

impl ReferenceClassifierConfig {
    /// Check hyperparameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.n_chunks == 0 {
            return Err(TrainError::InvalidConfig("n_chunks must be at least 1".to_string()));
        }
        if self.l2_weight.is_nan() || self.l2_weight <= 0.0 {
            return Err(TrainError::InvalidConfig(format!(
                "l2_weight must be positive, got {}",
                self.l2_weight
            )));
        }
        if self.tol.is_nan() || self.tol <= 0.0 {
            return Err(TrainError::InvalidConfig(format!("tol must be positive, got {}", self.tol)));
        }
        if self.max_iter == 0 {
            return Err(TrainError::InvalidConfig("max_iter must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl ExperimentConfig {
    /// Check split ratios.
    pub fn validate(&self) -> Result<()> {
        if !(2..=3).contains(&self.split.len()) {
            return Err(TrainError::InvalidConfig(format!(
                "split needs 2 or 3 ratios, got {}",
                self.split.len()
            )));
        }
        if self.split.iter().any(|&r| !(0.0..=1.0).contains(&r)) {
            return Err(TrainError::InvalidConfig(format!(
                "split ratios must lie in [0, 1], got {:?}",
                self.split
            )));
        }
        let total: f32 = self.split.iter().sum();
        if total > 1.0 + 1e-6 {
            return Err(TrainError::InvalidConfig(format!(
                "split ratios must sum to at most 1, got {}",
                total
            )));
        }
        Ok(())
    }
}

/// Full configuration of the reference classifier pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Experiment-level settings.
    pub experiment: ExperimentConfig,
    /// Dataset location.
    pub dataset: DatasetConfig,
    /// Classifier hyperparameters.
    pub reference_classifier: ReferenceClassifierConfig,
}

impl PipelineConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            TrainError::SerializationError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TrainError::SerializationError(format!("Failed to serialize: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.experiment.validate()?;
        self.reference_classifier.validate()
    }
}
