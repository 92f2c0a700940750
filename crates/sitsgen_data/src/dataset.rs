//! Labeled multivariate time series dataset.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use sitsgen_core::Seed;

use crate::error::{DataError, Result};
use crate::timeserie::TimeSerie;
use crate::tsfile::{load_ts_file, TsTable};

/// Preprocessing applied right after loading a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Number of leading dimensions to keep, all when `None`.
    pub ndim: Option<usize>,
    /// Number of label groups to regroup original labels into, unchanged when `None`.
    pub nclass: Option<usize>,
    /// Whether to min-max rescale every dimension to `[0, 1]`.
    pub rescale: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            ndim: None,
            nclass: None,
            rescale: true,
        }
    }
}

/// A labeled collection of multivariate time series.
///
/// Stores one row per series, each row holding one 1-D sequence per
/// dimension, and a label vector aligned with the rows. Preprocessing
/// operations mutate the dataset in place.
///
/// # Example
///
/// ```rust,ignore
/// use sitsgen_data::TSDataset;
///
/// let mut dataset = TSDataset::load("data/Toy_TRAIN.ts")?;
/// dataset.truncate_dimensions(3);
/// dataset.group_labels(4)?;
/// dataset.rescale()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct TSDataset {
    root: Option<PathBuf>,
    rows: Vec<Vec<Array1<f32>>>,
    labels: Vec<i64>,
    pub(crate) draw_pool: Option<Vec<usize>>,
}

impl TSDataset {
    /// Create a dataset from rows of per-dimension sequences and their labels.
    ///
    /// # Errors
    ///
    /// Returns an error if row and label counts differ or if rows do not all
    /// have the same number of dimensions.
    pub fn from_rows(rows: Vec<Vec<Array1<f32>>>, labels: Vec<i64>) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(DataError::InvalidShape(format!(
                "{} series but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        if let Some(first) = rows.first() {
            let ndim = first.len();
            if let Some(row) = rows.iter().find(|row| row.len() != ndim) {
                return Err(DataError::DimensionMismatch {
                    expected: ndim,
                    got: row.len(),
                });
            }
        }
        Ok(Self {
            root: None,
            rows,
            labels,
            draw_pool: None,
        })
    }

    /// Create a dataset from equal-length `(n_steps, n_dim)` series.
    pub fn from_series(series: &[Array2<f32>], labels: Vec<i64>) -> Result<Self> {
        let rows = series
            .iter()
            .map(|ts| ts.columns().into_iter().map(|col| col.to_owned()).collect())
            .collect();
        Self::from_rows(rows, labels)
    }

    /// Load a dataset from a `.ts` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let TsTable { rows, labels } = load_ts_file(path.as_ref())?;
        let mut dataset = Self::from_rows(rows, labels)?;
        dataset.root = Some(path.as_ref().to_path_buf());
        tracing::info!(
            "Loaded {} series of dimension {} from {}",
            dataset.len(),
            dataset.ndim(),
            path.as_ref().display()
        );
        Ok(dataset)
    }

    /// Load a dataset and apply [`PreprocessConfig`] to it.
    pub fn load_preprocessed<P: AsRef<Path>>(path: P, config: &PreprocessConfig) -> Result<Self> {
        let mut dataset = Self::load(path)?;
        dataset.preprocess(config)?;
        Ok(dataset)
    }

    /// Truncate dimensions, then group labels, then optionally rescale.
    pub fn preprocess(&mut self, config: &PreprocessConfig) -> Result<()> {
        if let Some(ndim) = config.ndim {
            self.truncate_dimensions(ndim as isize);
        }
        if let Some(nclass) = config.nclass {
            self.group_labels(nclass)?;
        }
        if config.rescale {
            self.rescale()?;
        }
        Ok(())
    }

    /// Source file, if loaded from disk.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the dataset is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of dimensions per series.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Labels aligned with rows.
    #[must_use]
    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Sorted distinct labels.
    #[must_use]
    pub fn unique_labels(&self) -> Vec<i64> {
        let mut unique = self.labels.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Per-dimension sequences of one series.
    pub fn row(&self, index: usize) -> Result<&[Array1<f32>]> {
        self.rows
            .get(index)
            .map(Vec::as_slice)
            .ok_or(DataError::IndexOutOfBounds {
                index,
                length: self.len(),
            })
    }

    /// Series at `index` as a `(n_steps, n_dim)` array along with its label.
    ///
    /// Dimensions shorter than the longest one are padded with their last value.
    pub fn get(&self, index: usize) -> Result<(Array2<f32>, i64)> {
        let row = self.row(index)?;
        let n_steps = row.iter().map(Array1::len).max().unwrap_or(0);
        let mut ts = Array2::<f32>::zeros((n_steps, row.len()));
        for (d, cell) in row.iter().enumerate() {
            let pad = cell.last().copied().unwrap_or(0.0);
            for t in 0..n_steps {
                ts[[t, d]] = cell.get(t).copied().unwrap_or(pad);
            }
        }
        Ok((ts, self.labels[index]))
    }

    /// `(n_dim,)` slice of series `index` at time step `t`.
    pub fn step(&self, index: usize, t: usize) -> Result<Array1<f32>> {
        let (ts, _) = self.get(index)?;
        if t >= ts.nrows() {
            return Err(DataError::IndexOutOfBounds {
                index: t,
                length: ts.nrows(),
            });
        }
        Ok(ts.row(t).to_owned())
    }

    /// Series at `index` wrapped for horizon-bounded iteration.
    pub fn series(&self, index: usize, horizon: Option<usize>, seed: Option<Seed>) -> Result<TimeSerie> {
        let (ts, label) = self.get(index)?;
        TimeSerie::new(ts, label, horizon, seed)
    }

    /// Keep only the first `ndim` dimensions. Negative values leave the dataset unchanged.
    pub fn truncate_dimensions(&mut self, ndim: isize) {
        if ndim < 0 {
            return;
        }
        let ndim = ndim as usize;
        for row in &mut self.rows {
            row.truncate(ndim);
        }
    }

    /// Keep only the first `length` series.
    ///
    /// Non-positive values or values not below the current length leave the
    /// dataset unchanged.
    pub fn truncate_length(&mut self, length: isize) {
        if length <= 0 || length as usize >= self.len() {
            return;
        }
        let length = length as usize;
        self.rows.truncate(length);
        self.labels.truncate(length);
        self.draw_pool = None;
    }

    /// Reorder series and labels to follow `indices`.
    ///
    /// Indices may repeat or omit series; the dataset becomes exactly the
    /// listed rows in the listed order.
    pub fn reorder(&mut self, indices: &[usize]) -> Result<()> {
        if let Some(&index) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(DataError::IndexOutOfBounds {
                index,
                length: self.len(),
            });
        }
        self.rows = indices.iter().map(|&i| self.rows[i].clone()).collect();
        self.labels = indices.iter().map(|&i| self.labels[i]).collect();
        self.draw_pool = None;
        Ok(())
    }

    /// Regroup labels into `n_groups` groups labelled `1..=n_groups`.
    ///
    /// The sorted distinct labels are split into `n_groups` contiguous parts
    /// of near-equal size, the first parts taking one extra label when the
    /// split is uneven. Every original label maps to the 1-based index of
    /// its part.
    pub fn group_labels(&mut self, n_groups: usize) -> Result<()> {
        if n_groups == 0 {
            return Err(DataError::InvalidInput("n_groups must be at least 1".to_string()));
        }
        let unique = self.unique_labels();
        let base = unique.len() / n_groups;
        let extra = unique.len() % n_groups;

        let mut mapping = HashMap::with_capacity(unique.len());
        let mut labels = unique.iter();
        for group in 0..n_groups {
            let size = base + usize::from(group < extra);
            for &label in labels.by_ref().take(size) {
                mapping.insert(label, group as i64 + 1);
            }
        }

        self.labels = self.labels.iter().map(|label| mapping[label]).collect();
        tracing::debug!("Grouped {} labels into {} groups", unique.len(), n_groups);
        Ok(())
    }

    /// Min-max rescale every dimension to `[0, 1]`.
    pub fn rescale(&mut self) -> Result<()> {
        self.min_max_rescale(0.0, 1.0)
    }

    /// Min-max rescale every dimension to `[amin, amax]`.
    ///
    /// Minimum and maximum are taken per dimension across all series, so
    /// relative amplitudes between series are preserved. Missing values stay
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::DegenerateDimension`] if a dimension is constant.
    pub fn min_max_rescale(&mut self, amin: f32, amax: f32) -> Result<()> {
        let bounds = (0..self.ndim())
            .map(|d| {
                let (min, max) = self.rows.iter().flat_map(|row| row[d].iter()).fold(
                    (f32::INFINITY, f32::NEG_INFINITY),
                    |(lo, hi), &x| (lo.min(x), hi.max(x)),
                );
                if max > min {
                    Ok((min, max))
                } else {
                    Err(DataError::DegenerateDimension { dim: d, value: min })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        for row in &mut self.rows {
            for (cell, &(min, max)) in row.iter_mut().zip(&bounds) {
                cell.mapv_inplace(|x| (amax - amin) * (x - min) / (max - min) + amin);
            }
        }
        Ok(())
    }

    /// Append the series and labels of `other`, returning `self`.
    ///
    /// See [`merge`].
    pub fn concat(&mut self, other: TSDataset) -> Result<&mut Self> {
        merge(self, other)?;
        Ok(self)
    }
}

/// Append the series and labels of `from` onto `into`.
///
/// `into` keeps its own rows first, so the series at global index
/// `into.len()` (before merging) is the first series of `from`.
///
/// # Errors
///
/// Returns [`DataError::DimensionMismatch`] if both datasets are non-empty
/// and differ in dimensionality.
pub fn merge(into: &mut TSDataset, from: TSDataset) -> Result<()> {
    if !into.is_empty() && !from.is_empty() && into.ndim() != from.ndim() {
        return Err(DataError::DimensionMismatch {
            expected: into.ndim(),
            got: from.ndim(),
        });
    }
    into.rows.extend(from.rows);
    into.labels.extend(from.labels);
    into.draw_pool = None;
    Ok(())
}

impl fmt::Display for TSDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "~~ Time Serie Dataset ~~")?;
        match &self.root {
            Some(root) => writeln!(f, "Dataset Path : {}", root.display())?,
            None => writeln!(f, "Dataset Path : <memory>")?,
        }
        writeln!(f, "Nb of samples : {}", self.len())?;
        writeln!(f, "Dimensionality : {}", self.ndim())?;
        write!(f, "Nb of classes : {}", self.unique_labels().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn create_test_dataset(n: usize, ndim: usize, n_steps: usize, n_labels: i64) -> TSDataset {
        let rows = (0..n)
            .map(|i| {
                (0..ndim)
                    .map(|d| Array1::from_shape_fn(n_steps, |t| (i * 3 + d * 7 + t) as f32))
                    .collect()
            })
            .collect();
        let labels = (0..n).map(|i| i as i64 % n_labels).collect();
        TSDataset::from_rows(rows, labels).unwrap()
    }

    #[test]
    fn test_dataset_creation() {
        let ds = create_test_dataset(10, 3, 5, 2);
        assert_eq!(ds.len(), 10);
        assert_eq!(ds.ndim(), 3);
        assert_eq!(ds.unique_labels(), vec![0, 1]);
    }

    #[test]
    fn test_from_rows_validates() {
        let rows = vec![vec![array![1.0, 2.0]], vec![array![1.0], array![2.0]]];
        assert!(matches!(
            TSDataset::from_rows(rows, vec![0, 1]),
            Err(DataError::DimensionMismatch { expected: 1, got: 2 })
        ));
        assert!(TSDataset::from_rows(vec![vec![array![1.0]]], vec![]).is_err());
    }

    #[test]
    fn test_get_pads_with_last_value() {
        let rows = vec![vec![array![1.0, 2.0, 3.0], array![5.0]]];
        let ds = TSDataset::from_rows(rows, vec![4]).unwrap();
        let (ts, label) = ds.get(0).unwrap();
        assert_eq!(label, 4);
        assert_eq!(ts, array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0]]);
        assert_eq!(ds.step(0, 1).unwrap(), array![2.0, 5.0]);
        assert!(ds.get(1).is_err());
    }

    #[test]
    fn test_truncate_dimensions() {
        let mut ds = create_test_dataset(4, 3, 5, 2);
        ds.truncate_dimensions(-1);
        assert_eq!(ds.ndim(), 3);
        ds.truncate_dimensions(2);
        assert_eq!(ds.ndim(), 2);
        ds.truncate_dimensions(10);
        assert_eq!(ds.ndim(), 2);
    }

    #[test]
    fn test_truncate_length() {
        let mut ds = create_test_dataset(10, 1, 3, 2);
        ds.truncate_length(-3);
        assert_eq!(ds.len(), 10);
        ds.truncate_length(20);
        assert_eq!(ds.len(), 10);
        ds.truncate_length(4);
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.labels().len(), 4);
    }

    #[test]
    fn test_reorder() {
        let mut ds = create_test_dataset(4, 1, 2, 4);
        ds.reorder(&[3, 0]).unwrap();
        assert_eq!(ds.labels(), &[3, 0]);
        assert!(ds.reorder(&[5]).is_err());
    }

    #[test]
    fn test_group_labels_partition() {
        let labels = vec![5, 9, 2, 7, 2, 11, 9];
        let rows = labels.iter().map(|_| vec![array![0.0, 1.0]]).collect();
        let mut ds = TSDataset::from_rows(rows, labels).unwrap();
        // unique = [2, 5, 7, 9, 11] -> [2, 5] [7, 9] [11]
        ds.group_labels(3).unwrap();
        assert_eq!(ds.labels(), &[1, 2, 1, 2, 1, 3, 2]);
    }

    #[test]
    fn test_group_labels_zero_groups() {
        let mut ds = create_test_dataset(4, 1, 2, 2);
        assert!(ds.group_labels(0).is_err());
    }

    #[test]
    fn test_group_labels_more_groups_than_labels() {
        let mut ds = create_test_dataset(6, 1, 2, 2);
        ds.group_labels(4).unwrap();
        assert_eq!(ds.unique_labels(), vec![1, 2]);
    }

    #[test]
    fn test_rescale_per_dimension() {
        let mut ds = create_test_dataset(6, 2, 4, 2);
        ds.min_max_rescale(-1.0, 2.0).unwrap();
        for d in 0..2 {
            let values: Vec<f32> = (0..ds.len()).flat_map(|i| ds.row(i).unwrap()[d].to_vec()).collect();
            let min = values.iter().copied().fold(f32::INFINITY, f32::min);
            let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            assert!((min + 1.0).abs() < 1e-6);
            assert!((max - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rescale_constant_dimension_fails() {
        let rows = vec![vec![array![1.0, 2.0], array![3.0, 3.0]], vec![array![0.0, 4.0], array![3.0, 3.0]]];
        let mut ds = TSDataset::from_rows(rows, vec![0, 1]).unwrap();
        assert!(matches!(
            ds.rescale(),
            Err(DataError::DegenerateDimension { dim: 1, .. })
        ));
    }

    #[test]
    fn test_merge_appends_in_order() {
        let mut a = create_test_dataset(5, 2, 3, 2);
        let b = create_test_dataset(3, 2, 3, 3);
        let b_first = b.get(0).unwrap();
        let a_len = a.len();

        a.concat(b.clone()).unwrap();
        assert_eq!(a.len(), a_len + b.len());
        assert_eq!(a.get(a_len).unwrap(), b_first);
    }

    #[test]
    fn test_merge_dimension_mismatch() {
        let mut a = create_test_dataset(2, 2, 3, 2);
        let b = create_test_dataset(2, 3, 3, 2);
        assert!(matches!(
            merge(&mut a, b),
            Err(DataError::DimensionMismatch { expected: 2, got: 3 })
        ));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_display() {
        let ds = create_test_dataset(3, 2, 3, 2);
        let text = ds.to_string();
        assert!(text.contains("Nb of samples : 3"));
        assert!(text.contains("Nb of classes : 2"));
    }
}
