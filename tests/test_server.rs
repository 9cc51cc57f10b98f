//! Integration test: Server API endpoints

use axum::body::Body;
use axum::http::{Request, StatusCode};
use downtime_classifier::server::{create_router, AppState, ServerConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "----downtime-test-boundary";

fn test_app() -> axum::Router {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_upload_size: Some(10 * 1024 * 1024),
    };
    let state = Arc::new(AppState::new(config.clone()));
    create_router(state, &config)
}

/// 40 rows; downtime is "Yes" exactly when Temperature >= 20
fn machines_csv() -> String {
    let mut csv = String::from("Temperature,Run_Time,Downtime\n");
    for i in 0..40 {
        let temperature = if i == 10 || i == 25 {
            String::new()
        } else {
            format!("{}.0", i)
        };
        let run_time = 100 + (i * 7) % 13;
        let downtime = if i >= 20 { "Yes" } else { "No" };
        csv.push_str(&format!("{},{},{}\n", temperature, run_time, downtime));
    }
    csv
}

fn multipart_request(field: &str, filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: text/csv\r\n\r\n{content}\r\n--{b}--\r\n",
        b = BOUNDARY,
        field = field,
        filename = filename,
        content = content,
    );
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn upload_machines(app: &axum::Router) {
    let (status, _) = send(app, multipart_request("file", "machines.csv", &machines_csv())).await;
    assert_eq!(status, StatusCode::OK);
}

async fn train_default(app: &axum::Router) -> (StatusCode, Value) {
    let body = json!({"features": ["Temperature", "Run_Time"], "target": "Downtime"});
    send(app, json_request("/train", body.to_string())).await
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["dataset_loaded"], false);
    assert_eq!(body["model_trained"], false);
}

#[tokio::test]
async fn test_root_serves_html() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("/upload"));
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Request::builder().uri("/nope").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().starts_with("Not found"));
}

#[tokio::test]
async fn test_wrong_method_returns_405() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Request::builder().uri("/upload").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed");
}

// ─── Upload ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_returns_columns_in_file_order() {
    let app = test_app();
    let (status, body) = send(&app, multipart_request("file", "abc.csv", "A,B,C\n1,2,3\n4,5,6\n")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "File uploaded successfully!");
    assert_eq!(body["columns"], json!(["A", "B", "C"]));

    let (_, health) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(health["dataset_loaded"], true);
}

#[tokio::test]
async fn test_upload_rejects_non_csv() {
    let app = test_app();
    let (status, body) = send(&app, multipart_request("file", "data.txt", "A,B\n1,2\n")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Upload a CSV file");
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = test_app();
    let (status, body) = send(&app, multipart_request("other", "data.csv", "A,B\n1,2\n")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_upload_empty_filename_is_not_csv() {
    let app = test_app();
    let (status, body) = send(&app, multipart_request("file", "", "A,B\n1,2\n")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Upload a CSV file");
}

#[tokio::test]
async fn test_upload_malformed_csv() {
    let app = test_app();
    let (status, body) = send(
        &app,
        multipart_request("file", "ragged.csv", "A,B\n1,2\n3,4,5,6\n"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Error reading CSV file: "));

    let (_, health) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(health["dataset_loaded"], false);
}

#[tokio::test]
async fn test_second_upload_replaces_dataset() {
    let app = test_app();
    let (_, body) = send(&app, multipart_request("file", "abc.csv", "A,B,C\n1,2,3\n")).await;
    assert_eq!(body["columns"], json!(["A", "B", "C"]));

    let (status, body) = send(&app, multipart_request("file", "machines.csv", &machines_csv())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["columns"], json!(["Temperature", "Run_Time", "Downtime"]));

    let (status, body) = send(
        &app,
        json_request("/train", json!({"features": ["A"], "target": "C"}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Column not found: A");

    let (status, _) = train_default(&app).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_upload_empty_csv() {
    let app = test_app();
    let (status, body) = send(&app, multipart_request("file", "empty.csv", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Error reading CSV file: "));
}

// ─── Train ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_train_before_upload() {
    let app = test_app();
    let (status, body) = train_default(&app).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No dataset uploaded");

    let (_, health) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(health["model_trained"], false);
}

#[tokio::test]
async fn test_train_requires_features_and_target() {
    let app = test_app();
    upload_machines(&app).await;

    let (status, body) = send(
        &app,
        json_request("/train", json!({"features": [], "target": "Downtime"}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Features and target must be provided!");

    let (status, _) = send(
        &app,
        json_request("/train", json!({"features": ["Temperature"]}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_train_invalid_json() {
    let app = test_app();
    upload_machines(&app).await;

    let (status, body) = send(&app, json_request("/train", "{features")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn test_train_unknown_column() {
    let app = test_app();
    upload_machines(&app).await;

    let (status, body) = send(
        &app,
        json_request("/train", json!({"features": ["Pressure"], "target": "Downtime"}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Column not found: Pressure");
}

#[tokio::test]
async fn test_train_success() {
    let app = test_app();
    upload_machines(&app).await;

    let (status, body) = train_default(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Model trained successfully");

    let matrix: Vec<Vec<u64>> = serde_json::from_value(body["confusion_matrix"].clone()).unwrap();
    let total: u64 = matrix.iter().flatten().sum();
    assert_eq!(total, 6); // ceil(0.15 * 40)

    let accuracy = body["accuracy"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&accuracy));
    assert!(body["f1_score"].is_number());
}

#[tokio::test]
async fn test_train_is_deterministic() {
    let app = test_app();
    upload_machines(&app).await;

    let (_, first) = train_default(&app).await;
    let (_, second) = train_default(&app).await;
    assert_eq!(first["confusion_matrix"], second["confusion_matrix"]);
    assert_eq!(first["accuracy"], second["accuracy"]);
}

// ─── Predict ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_predict_before_training() {
    let app = test_app();
    let (status, body) = send(
        &app,
        json_request("/predict", json!({"Temperature": 30.0, "Run_Time": 101}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Model is not trained, train the model first.");
}

#[tokio::test]
async fn test_predict_after_training() {
    let app = test_app();
    upload_machines(&app).await;
    train_default(&app).await;

    let (status, body) = send(
        &app,
        json_request("/predict", json!({"Temperature": 38.0, "Run_Time": 104}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Prediction done");
    assert_eq!(body["Downtime"], "Yes");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));

    let (_, body) = send(
        &app,
        json_request("/predict", json!({"Temperature": 1.0, "Run_Time": 104}).to_string()),
    )
    .await;
    assert_eq!(body["Downtime"], "NO");
}

#[tokio::test]
async fn test_predict_empty_input() {
    let app = test_app();
    upload_machines(&app).await;
    train_default(&app).await;

    let (status, body) = send(&app, json_request("/predict", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No input data provided");

    let (status, body) = send(&app, json_request("/predict", "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No input data provided");
}

#[tokio::test]
async fn test_predict_feature_count_mismatch() {
    let app = test_app();
    upload_machines(&app).await;
    train_default(&app).await;

    let (status, body) = send(
        &app,
        json_request("/predict", json!({"Temperature": 30.0}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_failed_training_keeps_previous_model() {
    let app = test_app();
    upload_machines(&app).await;
    train_default(&app).await;

    let (status, _) = send(
        &app,
        json_request("/train", json!({"features": ["Missing"], "target": "Downtime"}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request("/predict", json!({"Temperature": 38.0, "Run_Time": 104}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Downtime"], "Yes");
}

#[tokio::test]
async fn test_independent_states_do_not_share_sessions() {
    let first = test_app();
    let second = test_app();
    upload_machines(&first).await;

    let (status, body) = train_default(&second).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No dataset uploaded");
}
