//! Inference module
//!
//! Scores single records against a trained artifact snapshot: the record is
//! ordered into a feature row, standardized with the fitted scaler and run
//! through the decision tree for a class and its probability.

mod engine;

pub use engine::{InferenceEngine, Prediction, DOWNTIME_CLASS};
