//! Train/test splitting

use crate::error::{ClassifierError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of a single train/test split
#[derive(Debug, Clone, PartialEq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partitioned feature matrix and labels
#[derive(Debug, Clone)]
pub struct SplitData {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Holdout splitter. The test partition gets `ceil(test_size * n)` rows.
pub struct TrainTestSplit {
    test_size: f64,
    shuffle: bool,
    random_state: Option<u64>,
}

impl TrainTestSplit {
    pub fn new(test_size: f64) -> Self {
        Self {
            test_size,
            shuffle: true,
            random_state: None,
        }
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Number of test rows for `n_samples`
    pub fn test_len(&self, n_samples: usize) -> usize {
        (self.test_size * n_samples as f64).ceil() as usize
    }

    pub fn split_indices(&self, n_samples: usize) -> Result<SplitIndices> {
        let n_test = self.test_len(n_samples);
        if n_test == 0 || n_test >= n_samples {
            return Err(ClassifierError::ValidationError(format!(
                "with n_samples={} and test_size={}, the resulting train set would be empty",
                n_samples, self.test_size
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            let mut rng = match self.random_state {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            indices.shuffle(&mut rng);
        }

        let train = indices.split_off(n_test);
        Ok(SplitIndices { train, test: indices })
    }

    pub fn split(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<SplitData> {
        if x.nrows() != y.len() {
            return Err(ClassifierError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let SplitIndices { train, test } = self.split_indices(x.nrows())?;
        Ok(SplitData {
            x_train: x.select(Axis(0), &train),
            x_test: x.select(Axis(0), &test),
            y_train: y.select(Axis(0), &train),
            y_test: y.select(Axis(0), &test),
        })
    }
}
