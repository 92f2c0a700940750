//! Random draws from a [`TSDataset`].
//!
//! All draws take the RNG explicitly. Build it from a [`sitsgen_core::Seed`]
//! for reproducible draws.

use rand::distributions::WeightedIndex;
use rand::prelude::*;

use crate::dataset::TSDataset;
use crate::error::{DataError, Result};
use crate::timeserie::TimeSerie;

impl TSDataset {
    /// Draw the index of a random series.
    ///
    /// - With a `label`, draws uniformly among series carrying it. Drawing by
    ///   label without replacement is not supported.
    /// - Without a label and with replacement, draws uniformly over all series.
    /// - Without a label and without replacement, consumes a shuffled pool of
    ///   indices created on the first such draw; once the pool is empty every
    ///   further draw fails with [`DataError::Exhausted`].
    ///
    /// # Errors
    ///
    /// [`DataError::NoMatch`] if no series has `label`, [`DataError::NotImplemented`]
    /// for label draws without replacement, [`DataError::EmptyDataset`] when
    /// drawing with replacement from an empty dataset.
    pub fn sample_index<R: Rng + ?Sized>(
        &mut self,
        label: Option<i64>,
        replace: bool,
        rng: &mut R,
    ) -> Result<usize> {
        match label {
            Some(label) => self.choice_given_label(label, replace, rng),
            None => self.random_choice(replace, rng),
        }
    }

    /// Draw a random series, see [`TSDataset::sample_index`].
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        label: Option<i64>,
        replace: bool,
        rng: &mut R,
    ) -> Result<TimeSerie> {
        let index = self.sample_index(label, replace, rng)?;
        self.series(index, None, None)
    }

    fn choice_given_label<R: Rng + ?Sized>(&self, label: i64, replace: bool, rng: &mut R) -> Result<usize> {
        if !replace {
            return Err(DataError::NotImplemented(
                "random choice by label without replacement".to_string(),
            ));
        }
        let candidates: Vec<usize> = self
            .labels()
            .iter()
            .enumerate()
            .filter_map(|(i, &l)| (l == label).then_some(i))
            .collect();
        candidates.choose(rng).copied().ok_or(DataError::NoMatch { label })
    }

    fn random_choice<R: Rng + ?Sized>(&mut self, replace: bool, rng: &mut R) -> Result<usize> {
        if replace {
            if self.is_empty() {
                return Err(DataError::EmptyDataset);
            }
            return Ok(rng.gen_range(0..self.len()));
        }

        let n = self.len();
        let pool = self.draw_pool.get_or_insert_with(|| {
            let mut left_to_draw: Vec<usize> = (0..n).collect();
            left_to_draw.shuffle(rng);
            left_to_draw
        });
        pool.pop().ok_or(DataError::Exhausted)
    }

    /// Number of series still available to draws without replacement.
    ///
    /// `None` until the first such draw.
    #[must_use]
    pub fn left_to_draw(&self) -> Option<usize> {
        self.draw_pool.as_ref().map(Vec::len)
    }

    /// Draw `size` labels from a multinomial distribution over the sorted unique labels.
    ///
    /// # Errors
    ///
    /// [`DataError::InvalidInput`] if `distribution` does not have one weight
    /// per unique label or is not a valid set of weights.
    pub fn draw_label_sequence<R: Rng + ?Sized>(
        &self,
        size: usize,
        distribution: &[f64],
        rng: &mut R,
    ) -> Result<Vec<i64>> {
        let unique = self.unique_labels();
        if distribution.len() != unique.len() {
            return Err(DataError::InvalidInput(format!(
                "{} labels with distribution of size {}",
                unique.len(),
                distribution.len()
            )));
        }
        let weights = WeightedIndex::new(distribution)
            .map_err(|e| DataError::InvalidInput(format!("invalid label distribution: {}", e)))?;
        Ok((0..size).map(|_| unique[weights.sample(rng)]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use sitsgen_core::Seed;
    use std::collections::HashSet;

    fn create_test_dataset(labels: Vec<i64>) -> TSDataset {
        let rows = labels
            .iter()
            .enumerate()
            .map(|(i, _)| vec![Array1::from_elem(4, i as f32)])
            .collect();
        TSDataset::from_rows(rows, labels).unwrap()
    }

    #[test]
    fn test_sample_given_label() {
        let mut ds = create_test_dataset(vec![1, 2, 1, 3, 2, 1]);
        let mut rng = Seed::new(42).to_rng();
        for _ in 0..20 {
            let serie = ds.sample(Some(2), true, &mut rng).unwrap();
            assert_eq!(serie.label(), 2);
        }
    }

    #[test]
    fn test_sample_given_missing_label() {
        let mut ds = create_test_dataset(vec![1, 2]);
        let mut rng = Seed::new(0).to_rng();
        assert!(matches!(
            ds.sample_index(Some(7), true, &mut rng),
            Err(DataError::NoMatch { label: 7 })
        ));
    }

    #[test]
    fn test_sample_given_label_without_replacement_unsupported() {
        let mut ds = create_test_dataset(vec![1, 2]);
        let mut rng = Seed::new(0).to_rng();
        assert!(matches!(
            ds.sample_index(Some(1), false, &mut rng),
            Err(DataError::NotImplemented(_))
        ));
    }

    #[test]
    fn test_sample_without_replacement_exhausts() {
        let mut ds = create_test_dataset(vec![0; 8]);
        let mut rng = Seed::new(3).to_rng();
        assert_eq!(ds.left_to_draw(), None);

        let drawn: HashSet<usize> = (0..8)
            .map(|_| ds.sample_index(None, false, &mut rng).unwrap())
            .collect();
        assert_eq!(drawn.len(), 8);
        assert_eq!(ds.left_to_draw(), Some(0));
        assert!(matches!(
            ds.sample_index(None, false, &mut rng),
            Err(DataError::Exhausted)
        ));
    }

    #[test]
    fn test_sample_with_replacement_is_reproducible() {
        let mut ds = create_test_dataset(vec![0; 50]);
        let a: Vec<usize> = {
            let mut rng = Seed::new(9).to_rng();
            (0..10).map(|_| ds.sample_index(None, true, &mut rng).unwrap()).collect()
        };
        let b: Vec<usize> = {
            let mut rng = Seed::new(9).to_rng();
            (0..10).map(|_| ds.sample_index(None, true, &mut rng).unwrap()).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset_draw() {
        let mut ds = TSDataset::default();
        let mut rng = Seed::new(0).to_rng();
        assert!(matches!(ds.sample_index(None, true, &mut rng), Err(DataError::EmptyDataset)));
        assert!(matches!(ds.sample_index(None, false, &mut rng), Err(DataError::Exhausted)));
    }

    #[test]
    fn test_draw_label_sequence() {
        let ds = create_test_dataset(vec![3, 1, 3, 2]);
        let mut rng = Seed::new(1).to_rng();
        let seq = ds.draw_label_sequence(100, &[0.0, 1.0, 0.0], &mut rng).unwrap();
        assert_eq!(seq.len(), 100);
        assert!(seq.iter().all(|&l| l == 2));

        assert!(ds.draw_label_sequence(5, &[0.5, 0.5], &mut rng).is_err());
    }
}
