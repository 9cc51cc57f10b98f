//! Training engine implementation

use super::decision_tree::DecisionTree;
use super::metrics::ClassificationMetrics;
use super::split::TrainTestSplit;
use super::TrainingConfig;
use crate::error::{ClassifierError, Result};
use crate::preprocessing::{
    frame_to_matrix, nan_to_null, ClassLabel, Interpolator, LabelEncoder, MissingValueReport,
    StandardScaler,
};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Everything a prediction needs, fitted together by one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedArtifacts {
    /// Feature columns in the order the scaler and tree were fitted on
    pub feature_names: Vec<String>,
    pub target_name: String,
    pub encoder: LabelEncoder,
    pub scaler: StandardScaler,
    pub model: DecisionTree,
    pub trained_at: DateTime<Utc>,
}

/// Summary of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub metrics: ClassificationMetrics,
    pub missing_values: MissingValueReport,
    pub classes: Vec<ClassLabel>,
    pub feature_importances: Vec<(String, f64)>,
    pub n_train: usize,
    pub n_test: usize,
    pub training_time_secs: f64,
}

/// Result of [`TrainEngine::fit`]
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifacts: TrainedArtifacts,
    pub report: TrainingReport,
}

/// Runs the encode → interpolate → split → scale → fit → evaluate pipeline
#[derive(Debug, Clone)]
pub struct TrainEngine {
    config: TrainingConfig,
}

impl TrainEngine {
    /// Create a new training engine
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit encoder, scaler and tree on `df` and evaluate on a holdout split
    pub fn fit(&self, df: &DataFrame) -> Result<TrainingOutcome> {
        let start = Instant::now();
        self.config.validate()?;

        let features = &self.config.feature_columns;
        let target = &self.config.target_column;

        let columns = self.config.selected_columns();
        for name in &columns {
            if df.column(name).is_err() {
                return Err(ClassifierError::FeatureNotFound(name.clone()));
            }
        }
        let subset = nan_to_null(&df.select(columns.iter().map(|s| s.as_str()))?)?;

        let mut encoder = LabelEncoder::new();
        let target_series = subset.column(target)?.as_materialized_series();
        let y = encoder.fit_transform(target_series)?;
        debug!(target = %target, n_classes = encoder.n_classes(), "Encoded target labels");

        let missing_values = MissingValueReport::from_frame(&subset, df.height());
        for col in &missing_values.columns {
            info!(
                column = %col.name,
                missing = col.missing,
                percent = %format!("{:.2}", col.percent),
                "Missing values before interpolation"
            );
        }

        let filled = Interpolator::new(self.config.interpolation_order).transform(&subset, features)?;
        let x = frame_to_matrix(&filled, features)?;

        let mut splitter = TrainTestSplit::new(self.config.test_size).with_shuffle(self.config.shuffle);
        if let Some(seed) = self.config.random_seed {
            splitter = splitter.with_random_state(seed);
        }
        let split = splitter.split(&x, &y)?;

        let mut scaler = StandardScaler::new();
        let x_train = scaler.fit_transform(&split.x_train)?;
        let x_test = scaler.transform(&split.x_test)?;

        let params = &self.config.tree;
        let mut model = DecisionTree::new_classifier()
            .with_criterion(params.criterion)
            .with_min_samples_split(params.min_samples_split)
            .with_min_samples_leaf(params.min_samples_leaf);
        if let Some(depth) = params.max_depth {
            model = model.with_max_depth(depth);
        }
        if let Some(seed) = params.random_state {
            model = model.with_random_state(seed);
        }
        model.fit(&x_train, &split.y_train)?;

        let y_pred = model.predict(&x_test)?;
        let metrics = ClassificationMetrics::compute(&split.y_test, &y_pred);

        let feature_importances = model
            .feature_importances()
            .map(|imp| features.iter().cloned().zip(imp.iter().copied()).collect())
            .unwrap_or_default();

        let report = TrainingReport {
            metrics,
            missing_values,
            classes: encoder.classes().to_vec(),
            feature_importances,
            n_train: x_train.nrows(),
            n_test: x_test.nrows(),
            training_time_secs: start.elapsed().as_secs_f64(),
        };

        info!(
            n_train = report.n_train,
            n_test = report.n_test,
            depth = model.get_depth(),
            leaves = model.get_n_leaves(),
            accuracy = report.metrics.accuracy,
            f1_score = report.metrics.f1_score,
            elapsed_secs = report.training_time_secs,
            "Training finished"
        );

        let artifacts = TrainedArtifacts {
            feature_names: features.clone(),
            target_name: target.clone(),
            encoder,
            scaler,
            model,
            trained_at: Utc::now(),
        };

        Ok(TrainingOutcome { artifacts, report })
    }
}
