//! Decision tree classifier

use crate::error::{ClassifierError, Result};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Values closer than this are treated as equal when looking for thresholds
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding the class distribution of its training samples
    Leaf {
        class_counts: Vec<f64>,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Criterion {
    /// Gini impurity
    Gini,
    /// Shannon entropy
    Entropy,
}

impl Criterion {
    fn impurity(&self, counts: &[f64], n: f64) -> f64 {
        if n <= 0.0 {
            return 0.0;
        }
        match self {
            Criterion::Gini => 1.0 - counts.iter().map(|&c| (c / n).powi(2)).sum::<f64>(),
            Criterion::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0.0)
                .map(|&c| {
                    let p = c / n;
                    p * p.log2()
                })
                .sum::<f64>(),
        }
    }
}

/// Best split found for one feature
struct Candidate {
    rank: usize,
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Decision tree classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth (root is depth 0)
    pub max_depth: Option<usize>,
    /// Minimum samples to split an internal node
    pub min_samples_split: usize,
    /// Minimum samples in each leaf
    pub min_samples_leaf: usize,
    pub criterion: Criterion,
    /// Seed for the order in which features are searched; breaks ties
    /// between equally good splits.
    pub random_state: Option<u64>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
    classes: Vec<f64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new_classifier()
    }
}

impl DecisionTree {
    /// Create a new classifier tree
    pub fn new_classifier() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::Gini,
            random_state: None,
            n_features: 0,
            feature_importances: None,
            classes: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ClassifierError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ClassifierError::ValidationError(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ClassifierError::DataError(
                "input contains NaN or infinite values".to_string(),
            ));
        }

        let mut classes: Vec<f64> = y.iter().copied().collect();
        classes.sort_by(|a, b| a.total_cmp(b));
        classes.dedup();

        let y_idx: Vec<usize> = y
            .iter()
            .map(|v| classes.partition_point(|c| c < v))
            .collect();

        let mut feature_order: Vec<usize> = (0..n_features).collect();
        let mut rng = match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        feature_order.shuffle(&mut rng);

        self.n_features = n_features;
        self.classes = classes;

        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        let root = self.build_tree(x, &y_idx, &indices, 0, &feature_order, &mut importances);
        self.root = Some(root);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn class_counts(&self, y_idx: &[usize], indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.classes.len()];
        for &i in indices {
            counts[y_idx[i]] += 1.0;
        }
        counts
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y_idx: &[usize],
        indices: &[usize],
        depth: usize,
        feature_order: &[usize],
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = self.class_counts(y_idx, indices);
        let impurity = self.criterion.impurity(&counts, n_samples as f64);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || impurity <= f64::EPSILON;

        if should_stop {
            return TreeNode::Leaf { class_counts: counts, n_samples };
        }

        let Some(best) = self.find_best_split(x, y_idx, indices, &counts, impurity, feature_order)
        else {
            return TreeNode::Leaf { class_counts: counts, n_samples };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        if left_indices.len() < self.min_samples_leaf || right_indices.len() < self.min_samples_leaf {
            return TreeNode::Leaf { class_counts: counts, n_samples };
        }

        importances[best.feature_idx] += n_samples as f64 * best.gain;

        let left = Box::new(self.build_tree(x, y_idx, &left_indices, depth + 1, feature_order, importances));
        let right = Box::new(self.build_tree(x, y_idx, &right_indices, depth + 1, feature_order, importances));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y_idx: &[usize],
        indices: &[usize],
        parent_counts: &[f64],
        parent_impurity: f64,
        feature_order: &[usize],
    ) -> Option<Candidate> {
        let n = indices.len();

        // Each feature is scanned independently; ties resolve to the feature
        // visited first in the seeded order.
        feature_order
            .par_iter()
            .enumerate()
            .filter_map(|(rank, &feature_idx)| {
                let mut sorted = indices.to_vec();
                sorted.sort_by(|&a, &b| x[[a, feature_idx]].total_cmp(&x[[b, feature_idx]]));

                let mut left = vec![0.0; parent_counts.len()];
                let mut right = parent_counts.to_vec();
                let mut best: Option<(f64, f64)> = None;

                for pos in 0..n - 1 {
                    let class = y_idx[sorted[pos]];
                    left[class] += 1.0;
                    right[class] -= 1.0;

                    let current = x[[sorted[pos], feature_idx]];
                    let next = x[[sorted[pos + 1], feature_idx]];
                    if next <= current + FEATURE_THRESHOLD {
                        continue;
                    }

                    let n_left = pos + 1;
                    let n_right = n - n_left;
                    if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                        continue;
                    }

                    let weighted = (n_left as f64 * self.criterion.impurity(&left, n_left as f64)
                        + n_right as f64 * self.criterion.impurity(&right, n_right as f64))
                        / n as f64;
                    let gain = parent_impurity - weighted;

                    if best.map_or(true, |(g, _)| gain > g) {
                        let mut threshold = current / 2.0 + next / 2.0;
                        if threshold >= next || !threshold.is_finite() {
                            threshold = current;
                        }
                        best = Some((gain, threshold));
                    }
                }

                best.filter(|(gain, _)| *gain > 0.0).map(|(gain, threshold)| Candidate {
                    rank,
                    feature_idx,
                    threshold,
                    gain,
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .fold(None, |acc: Option<Candidate>, c| match acc {
                Some(a) if a.gain > c.gain || (a.gain == c.gain && a.rank < c.rank) => Some(a),
                _ => Some(c),
            })
    }

    fn leaf_for<'a>(&'a self, sample: &[f64]) -> Result<&'a [f64]> {
        let mut node = self.root.as_ref().ok_or(ClassifierError::ModelNotFitted)?;
        loop {
            match node {
                TreeNode::Leaf { class_counts, .. } => return Ok(class_counts.as_slice()),
                TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                    node = if sample[*feature_idx] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<()> {
        if self.root.is_none() {
            return Err(ClassifierError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ClassifierError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }

    /// Predict the class of each row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_input(x)?;

        let predictions = x
            .rows()
            .into_iter()
            .map(|row| {
                let counts = self.leaf_for(&row.to_vec())?;
                let best = counts
                    .iter()
                    .enumerate()
                    .fold(0, |best, (i, &c)| if c > counts[best] { i } else { best });
                Ok(self.classes[best])
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(Array1::from_vec(predictions))
    }

    /// Class probabilities per row, columns ordered as [`Self::classes`]
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_input(x)?;

        let n_classes = self.classes.len();
        let mut out = Array2::zeros((x.nrows(), n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            let counts = self.leaf_for(&row.to_vec())?;
            let total: f64 = counts.iter().sum();
            for (j, &c) in counts.iter().enumerate() {
                out[[i, j]] = if total > 0.0 { c / total } else { 0.0 };
            }
        }
        Ok(out)
    }

    /// Class values seen during fit, ascending
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Normalized impurity decrease per feature
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Number of split levels below the root
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }
}
