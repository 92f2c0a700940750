//! Classifier and evaluation artifacts.
//!
//! A run writes into its output directory:
//! - `classifier.json` - the fitted classifier
//! - `accuracy.metric` - validation accuracy as a plain float
//! - `confusion_matrix.json` - labels and row-normalized matrix
//! - `confusion_matrix.txt` - the same matrix as a text table
//! - `confusion_matrix.png` - the same matrix as a heatmap
//!
//! # Example
//!
//! ```rust,ignore
//! use sitsgen_train::export::{load_classifier, save_classifier};
//!
//! save_classifier(&classifier, "./out")?;
//! let classifier = load_classifier("./out")?;
//! ```

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use sitsgen_analysis::{HeatmapConfig, NormalizedConfusion};

use crate::classifier::LogisticRegression;
use crate::error::{Result, TrainError};

/// Serialized classifier file name.
pub const CLASSIFIER_FILE: &str = "classifier.json";
/// Accuracy file name.
pub const ACCURACY_FILE: &str = "accuracy.metric";
/// Confusion matrix file name.
pub const CONFUSION_JSON_FILE: &str = "confusion_matrix.json";
/// Rendered confusion matrix file name.
pub const CONFUSION_TABLE_FILE: &str = "confusion_matrix.txt";
/// Confusion matrix heatmap file name.
pub const CONFUSION_IMAGE_FILE: &str = "confusion_matrix.png";

/// Paths written by [`save_confusion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionArtifacts {
    /// Labels and matrix as JSON.
    pub json: PathBuf,
    /// Text table.
    pub table: PathBuf,
    /// PNG heatmap.
    pub image: PathBuf,
}

impl ConfusionArtifacts {
    /// All paths, JSON first.
    pub fn into_paths(self) -> [PathBuf; 3] {
        [self.json, self.table, self.image]
    }
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .map_err(|e| TrainError::ArtifactError(format!("Failed to create {}: {}", path.display(), e)))
}

/// Save a fitted classifier to `dir`. Returns the written path.
pub fn save_classifier(classifier: &LogisticRegression, dir: impl AsRef<Path>) -> Result<PathBuf> {
    if !classifier.is_fitted() {
        return Err(TrainError::NotFitted);
    }
    let dir = dir.as_ref();
    create_dir(dir)?;
    let path = dir.join(CLASSIFIER_FILE);
    save_json(classifier, &path)?;
    tracing::info!("Saved classifier to {}", path.display());
    Ok(path)
}

/// Load a classifier saved by [`save_classifier`].
pub fn load_classifier(dir: impl AsRef<Path>) -> Result<LogisticRegression> {
    load_json(&dir.as_ref().join(CLASSIFIER_FILE))
}

/// Write `accuracy` to `dir` as a plain float.
pub fn save_accuracy(accuracy: f64, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    create_dir(dir)?;
    let path = dir.join(ACCURACY_FILE);
    std::fs::write(&path, accuracy.to_string())
        .map_err(|e| TrainError::ArtifactError(format!("Failed to write file: {}", e)))?;
    Ok(path)
}

/// Read an accuracy written by [`save_accuracy`].
pub fn load_accuracy(dir: impl AsRef<Path>) -> Result<f64> {
    let path = dir.as_ref().join(ACCURACY_FILE);
    let text = std::fs::read_to_string(&path)
        .map_err(|e| TrainError::ArtifactError(format!("Failed to read file: {}", e)))?;
    text.trim()
        .parse()
        .map_err(|e| TrainError::SerializationError(format!("Invalid accuracy in {}: {}", path.display(), e)))
}

/// Write the confusion matrix to `dir` as JSON, as a text table and as a
/// PNG heatmap in the matrix's label order.
pub fn save_confusion(confusion: &NormalizedConfusion, dir: impl AsRef<Path>) -> Result<ConfusionArtifacts> {
    let dir = dir.as_ref();
    create_dir(dir)?;

    let json_path = dir.join(CONFUSION_JSON_FILE);
    save_json(confusion, &json_path)?;

    let table_path = dir.join(CONFUSION_TABLE_FILE);
    std::fs::write(&table_path, confusion.to_string_table())
        .map_err(|e| TrainError::ArtifactError(format!("Failed to write file: {}", e)))?;

    let image_path = dir.join(CONFUSION_IMAGE_FILE);
    confusion
        .save_heatmap(&image_path, &HeatmapConfig::default())
        .map_err(|e| TrainError::ArtifactError(format!("Failed to write {}: {}", image_path.display(), e)))?;
    tracing::info!("Saved confusion matrix to {}", image_path.display());

    Ok(ConfusionArtifacts {
        json: json_path,
        table: table_path,
        image: image_path,
    })
}

/// Read a confusion matrix written by [`save_confusion`].
pub fn load_confusion(dir: impl AsRef<Path>) -> Result<NormalizedConfusion> {
    load_json(&dir.as_ref().join(CONFUSION_JSON_FILE))
}

/// Save data as JSON.
fn save_json<T: Serialize>(data: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| TrainError::SerializationError(format!("Failed to serialize: {}", e)))?;
    std::fs::write(path, json)
        .map_err(|e| TrainError::ArtifactError(format!("Failed to write file: {}", e)))
}

/// Load data from JSON.
fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| TrainError::ArtifactError(format!("Failed to read file: {}", e)))?;
    serde_json::from_str(&json)
        .map_err(|e| TrainError::SerializationError(format!("Failed to deserialize: {}", e)))
}
