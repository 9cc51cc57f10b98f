//! Training configuration

use super::decision_tree::Criterion;
use crate::error::{ClassifierError, Result};
use serde::{Deserialize, Serialize};

/// Decision tree hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub criterion: Criterion,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub random_state: Option<u64>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            criterion: Criterion::Gini,
            max_depth: Some(12),
            min_samples_split: 4,
            min_samples_leaf: 2,
            random_state: Some(42),
        }
    }
}

/// Configuration for a single training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Feature columns, in the order the scaler and tree see them
    pub feature_columns: Vec<String>,
    pub target_column: String,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    pub shuffle: bool,
    pub random_seed: Option<u64>,
    pub interpolation_order: usize,
    pub tree: TreeParams,
}

impl TrainingConfig {
    /// Create a config with default split and tree settings
    pub fn new(feature_columns: Vec<String>, target_column: impl Into<String>) -> Self {
        Self {
            feature_columns,
            target_column: target_column.into(),
            test_size: 0.15,
            shuffle: true,
            random_seed: Some(42),
            interpolation_order: 2,
            tree: TreeParams::default(),
        }
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_interpolation_order(mut self, order: usize) -> Self {
        self.interpolation_order = order;
        self
    }

    pub fn with_tree_params(mut self, tree: TreeParams) -> Self {
        self.tree = tree;
        self
    }

    /// Feature columns followed by the target, without duplicates
    pub fn selected_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::with_capacity(self.feature_columns.len() + 1);
        for name in self.feature_columns.iter().chain(std::iter::once(&self.target_column)) {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        columns
    }

    pub fn validate(&self) -> Result<()> {
        if self.feature_columns.is_empty() || self.feature_columns.iter().any(|f| f.is_empty()) {
            return Err(ClassifierError::ValidationError(
                "at least one non-empty feature column is required".to_string(),
            ));
        }
        if self.target_column.is_empty() {
            return Err(ClassifierError::ValidationError(
                "target column is required".to_string(),
            ));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ClassifierError::ValidationError(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.tree.min_samples_split < 2 || self.tree.min_samples_leaf < 1 {
            return Err(ClassifierError::ValidationError(
                "min_samples_split must be >= 2 and min_samples_leaf >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
