//! Inference engine implementation

use crate::error::{ClassifierError, Result};
use crate::preprocessing::ClassLabel;
use crate::training::TrainedArtifacts;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Class code reported as downtime
pub const DOWNTIME_CLASS: usize = 1;

/// Outcome for a single record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Encoded class predicted by the tree
    pub class_code: usize,
    /// Original target label for `class_code`
    pub label: ClassLabel,
    /// Highest class probability for the record
    pub confidence: f64,
    pub probabilities: Vec<f64>,
}

impl Prediction {
    pub fn is_downtime(&self) -> bool {
        self.class_code == DOWNTIME_CLASS
    }

    /// `"Yes"` for the downtime class, `"NO"` otherwise
    pub fn downtime_label(&self) -> &'static str {
        if self.is_downtime() {
            "Yes"
        } else {
            "NO"
        }
    }
}

/// Applies one immutable artifact snapshot to incoming records
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    artifacts: Arc<TrainedArtifacts>,
}

impl InferenceEngine {
    pub fn new(artifacts: Arc<TrainedArtifacts>) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &TrainedArtifacts {
        &self.artifacts
    }

    /// Turn a JSON record into a single feature row.
    ///
    /// Values are taken by training feature name when every name is present,
    /// otherwise positionally in the record's key order.
    pub fn record_to_row(&self, record: &Map<String, Value>) -> Result<Array2<f64>> {
        let names = &self.artifacts.feature_names;
        if record.len() != names.len() {
            return Err(ClassifierError::ShapeError {
                expected: format!("{} features", names.len()),
                actual: format!("{} features", record.len()),
            });
        }

        let values: Vec<(&str, &Value)> = if names.iter().all(|n| record.contains_key(n)) {
            names
                .iter()
                .filter_map(|n| record.get(n).map(|v| (n.as_str(), v)))
                .collect()
        } else {
            record.iter().map(|(k, v)| (k.as_str(), v)).collect()
        };

        let row = values
            .into_iter()
            .map(|(name, value)| value_to_f64(name, value))
            .collect::<Result<Vec<f64>>>()?;

        Ok(Array2::from_shape_vec((1, names.len()), row)?)
    }

    /// Predict a scaled feature matrix
    pub fn predict_array(&self, x: &Array2<f64>) -> Result<Vec<Prediction>> {
        let scaled = self.artifacts.scaler.transform(x)?;
        let model = &self.artifacts.model;

        let classes = model.predict(&scaled)?;
        let proba = model.predict_proba(&scaled)?;
        let labels = self.artifacts.encoder.inverse_transform(&classes.to_vec())?;

        Ok(classes
            .iter()
            .zip(proba.rows())
            .zip(labels)
            .map(|((&code, row), label)| Prediction {
                class_code: code.round() as usize,
                label,
                confidence: row.iter().copied().fold(0.0, f64::max),
                probabilities: row.to_vec(),
            })
            .collect())
    }

    /// Predict a single JSON record
    pub fn predict_record(&self, record: &Map<String, Value>) -> Result<Prediction> {
        let x = self.record_to_row(record)?;
        self.predict_array(&x)?
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::InferenceError("no prediction produced".to_string()))
    }
}

fn value_to_f64(name: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            ClassifierError::DataError(format!("feature '{}' is not representable as f64", name))
        }),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            ClassifierError::DataError(format!(
                "feature '{}' could not convert string to float: '{}'",
                name, s
            ))
        }),
        Value::Null => Err(ClassifierError::DataError(format!("feature '{}' is missing", name))),
        _ => Err(ClassifierError::DataError(format!(
            "feature '{}' must be a scalar value",
            name
        ))),
    }
}
