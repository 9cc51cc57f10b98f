//! Application state management

use chrono::{DateTime, Utc};
use polars::prelude::*;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::training::TrainedArtifacts;

use super::ServerConfig;

/// The uploaded dataset
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub frame: DataFrame,
    pub uploaded_at: DateTime<Utc>,
}

impl Dataset {
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Dataset and trained artifacts for one working session.
///
/// Both slots hold `Arc` snapshots: readers clone the `Arc` and drop the lock,
/// writers swap the whole value, so a reader never sees a half-replaced set.
#[derive(Default)]
pub struct Session {
    dataset: RwLock<Option<Arc<Dataset>>>,
    artifacts: RwLock<Option<Arc<TrainedArtifacts>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held dataset
    pub async fn replace_dataset(&self, name: String, frame: DataFrame) -> Arc<Dataset> {
        let dataset = Arc::new(Dataset {
            name,
            frame,
            uploaded_at: Utc::now(),
        });
        *self.dataset.write().await = Some(Arc::clone(&dataset));
        dataset
    }

    pub async fn dataset(&self) -> Option<Arc<Dataset>> {
        self.dataset.read().await.clone()
    }

    /// Swap in a freshly trained artifact set
    pub async fn install_artifacts(&self, artifacts: TrainedArtifacts) -> Arc<TrainedArtifacts> {
        let artifacts = Arc::new(artifacts);
        *self.artifacts.write().await = Some(Arc::clone(&artifacts));
        artifacts
    }

    pub async fn artifacts(&self) -> Option<Arc<TrainedArtifacts>> {
        self.artifacts.read().await.clone()
    }
}

/// Application state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    pub session: Session,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            session: Session::new(),
            started_at: Utc::now(),
        }
    }
}
