//! Downtime classifier
//!
//! A small HTTP service around a decision tree: upload a CSV dataset, train a
//! classifier on chosen feature columns, then score single records for
//! machine downtime.
//!
//! # Modules
//!
//! - [`preprocessing`] - Label encoding, missing-value interpolation, scaling
//! - [`training`] - Decision tree, train/test split, metrics, [`training::TrainEngine`]
//! - [`inference`] - Record scoring against trained artifacts
//! - [`server`] - axum HTTP server holding the session state
//! - [`cli`] - Command-line interface
//! - [`utils`] - CSV loading

pub mod error;

pub mod preprocessing;
pub mod training;
pub mod inference;

pub mod server;
pub mod cli;
pub mod utils;

pub use error::{ClassifierError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{ClassifierError, Result};
    pub use crate::inference::{InferenceEngine, Prediction};
    pub use crate::preprocessing::{ClassLabel, Interpolator, LabelEncoder, StandardScaler};
    pub use crate::server::{create_router, AppState, ServerConfig};
    pub use crate::training::{
        ClassificationMetrics, DecisionTree, TrainEngine, TrainedArtifacts, TrainingConfig,
    };
    pub use crate::utils::DataLoader;
}
