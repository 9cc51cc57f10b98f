//! HTTP request handlers

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Html,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::inference::InferenceEngine;
use crate::training::{TrainEngine, TrainingConfig};
use crate::utils::DataLoader;

use super::error::{Result, ServerError};
use super::state::AppState;

fn parse_json<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| ServerError::BadRequest(format!("Invalid JSON body: {}", e)))
}

// ============================================================================
// Upload
// ============================================================================

pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let mut multipart = multipart.map_err(|e| {
        debug!(error = %e, "Upload request is not multipart");
        ServerError::BadRequest("No file uploaded".to_string())
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        // A part without a filename is a plain form value, not a file
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if !file_name.ends_with(".csv") {
            return Err(ServerError::BadRequest("Upload a CSV file".to_string()));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;
        info!(file = %file_name, bytes = data.len(), "Received upload");

        let df = DataLoader::new()
            .load_csv_bytes(&data)
            .map_err(|e| ServerError::BadRequest(format!("Error reading CSV file: {}", e)))?;

        let dataset = state.session.replace_dataset(file_name, df).await;
        let columns = dataset.column_names();
        info!(
            file = %dataset.name,
            rows = dataset.frame.height(),
            columns = columns.len(),
            "Dataset replaced"
        );

        return Ok(Json(json!({
            "message": "File uploaded successfully!",
            "columns": columns,
        })));
    }

    Err(ServerError::BadRequest("No file uploaded".to_string()))
}

// ============================================================================
// Training
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TrainRequest {
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub target: Option<String>,
}

pub async fn train_model(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>> {
    let dataset = state
        .session
        .dataset()
        .await
        .ok_or_else(|| ServerError::BadRequest("No dataset uploaded".to_string()))?;

    let request: TrainRequest = parse_json(&body)?;
    let (features, target) = match (request.features, request.target) {
        (Some(features), Some(target)) if !features.is_empty() && !target.is_empty() => {
            (features, target)
        }
        _ => {
            return Err(ServerError::BadRequest(
                "Features and target must be provided!".to_string(),
            ))
        }
    };

    info!(
        dataset = %dataset.name,
        features = ?features,
        target = %target,
        "Training requested"
    );

    let config = TrainingConfig::new(features, target);
    let frame = dataset.frame.clone();
    let outcome = tokio::task::spawn_blocking(move || TrainEngine::new(config).fit(&frame))
        .await
        .map_err(|e| ServerError::Internal(format!("Training task failed: {}", e)))??;

    let metrics = outcome.report.metrics;
    state.session.install_artifacts(outcome.artifacts).await;

    info!(
        accuracy = metrics.accuracy,
        f1_score = metrics.f1_score,
        n_test = metrics.n_samples,
        "Model installed"
    );

    Ok(Json(json!({
        "message": "Model trained successfully",
        "confusion_matrix": metrics.confusion_matrix.matrix,
        "accuracy": metrics.accuracy,
        "f1_score": metrics.f1_score,
    })))
}

// ============================================================================
// Inference
// ============================================================================

pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>> {
    let artifacts = state.session.artifacts().await.ok_or_else(|| {
        ServerError::BadRequest("Model is not trained, train the model first.".to_string())
    })?;

    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ServerError::BadRequest("No input data provided".to_string()));
    }
    let record = match parse_json::<Value>(&body)? {
        Value::Object(map) if !map.is_empty() => map,
        other => {
            warn!(kind = %json_kind(&other), "Rejected prediction input");
            return Err(ServerError::BadRequest("No input data provided".to_string()));
        }
    };

    let engine = InferenceEngine::new(artifacts);
    let prediction = engine.predict_record(&record)?;
    debug!(
        label = %prediction.label,
        class_code = prediction.class_code,
        confidence = prediction.confidence,
        "Prediction decoded"
    );

    Ok(Json(json!({
        "message": "Prediction done",
        "Downtime": prediction.downtime_label(),
        "confidence": prediction.confidence,
    })))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "empty object",
    }
}

// ============================================================================
// System
// ============================================================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let uptime = chrono::Utc::now().signed_duration_since(state.started_at);
    Json(json!({
        "status": "healthy",
        "dataset_loaded": state.session.dataset().await.is_some(),
        "model_trained": state.session.artifacts().await.is_some(),
        "uptime_secs": uptime.num_seconds(),
    }))
}

pub async fn serve_index() -> Html<&'static str> {
    Html(EMBEDDED_INDEX_HTML)
}

const EMBEDDED_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Downtime Classifier</title>
    <style>
        body { font-family: sans-serif; max-width: 760px; margin: 2rem auto; line-height: 1.5; }
        code, pre { background: #f3f3f3; padding: 0.1rem 0.3rem; }
        pre { padding: 0.75rem; overflow-x: auto; }
    </style>
</head>
<body>
    <h1>Downtime Classifier</h1>
    <p>Train a decision tree on a CSV dataset and predict machine downtime.</p>

    <h2>1. Upload</h2>
    <p><code>POST /upload</code> with a multipart form field named <code>file</code> holding a <code>.csv</code> file.</p>
    <pre>curl -F "file=@machines.csv" http://localhost:8080/upload</pre>

    <h2>2. Train</h2>
    <p><code>POST /train</code> with the feature columns and the target column.</p>
    <pre>curl -H "Content-Type: application/json" \
     -d '{"features": ["Temperature", "Run_Time"], "target": "Downtime_Flag"}' \
     http://localhost:8080/train</pre>

    <h2>3. Predict</h2>
    <p><code>POST /predict</code> with one record holding a value for every trained feature.</p>
    <pre>curl -H "Content-Type: application/json" \
     -d '{"Temperature": 82.5, "Run_Time": 140}' \
     http://localhost:8080/predict</pre>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_request_fields_optional() {
        let req: TrainRequest = parse_json(br#"{"features": ["a"]}"#).unwrap();
        assert_eq!(req.features, Some(vec!["a".to_string()]));
        assert!(req.target.is_none());
    }

    #[test]
    fn test_invalid_json_message() {
        let err = parse_json::<Value>(b"{not json").unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON body: "));
    }
}
