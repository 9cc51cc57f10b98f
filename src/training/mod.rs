//! Model training module
//!
//! Provides the pieces of a training run:
//! - Decision tree classifier (Gini or entropy)
//! - Seeded train/test splitting
//! - Classification metrics (confusion matrix, accuracy, F1)
//! - The [`TrainEngine`] that wires preprocessing and fitting together

mod config;
mod engine;
pub mod decision_tree;
pub mod metrics;
pub mod split;

pub use config::{TrainingConfig, TreeParams};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use engine::{TrainEngine, TrainedArtifacts, TrainingOutcome, TrainingReport};
pub use metrics::{ClassificationMetrics, ConfusionMatrix};
pub use split::{SplitData, SplitIndices, TrainTestSplit};
