use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use waypoint_backend::{create_app, History, RateLimitConfig};
use waypoint_history::JsonFileRepository;

/// Helper to create an app over a temp history directory
fn setup_app(ingest_token: Option<&str>, body_limit: usize) -> (TempDir, axum::Router) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let repository =
        JsonFileRepository::open(temp.path()).expect("Failed to open history dir");
    let app = create_app(
        Arc::new(History::new(repository)),
        ingest_token.map(str::to_string),
        body_limit,
        std::time::Duration::from_secs(30),
        RateLimitConfig::default(),
    );
    (temp, app)
}

/// Helper to send a request and get response
async fn send_request(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    auth_token: Option<&str>,
) -> (StatusCode, Value) {
    let mut request_builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("x-forwarded-for", "127.0.0.1");

    if let Some(token) = auth_token {
        request_builder = request_builder.header("Authorization", format!("Bearer {}", token));
    }

    let request = if let Some(json_body) = body {
        request_builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&json_body).unwrap()))
            .unwrap()
    } else {
        request_builder.body(Body::empty()).unwrap()
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes();

    let json = if body_bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(json!({}))
    };

    (status, json)
}

#[tokio::test]
async fn test_error_response_format_for_invalid_server_name() {
    let (_temp, app) = setup_app(None, 1024 * 1024);

    let (status, body) = send_request(
        app,
        "POST",
        "/servers/no.dots/snapshot",
        Some(json!([])),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Server name contains invalid characters (only alphanumeric, '-' and '_' allowed)"})
    );
}

#[tokio::test]
async fn test_error_response_format_for_too_long_server_name() {
    let (_temp, app) = setup_app(None, 1024 * 1024);
    let uri = format!("/servers/{}/players", "x".repeat(65));

    let (status, body) = send_request(app, "GET", &uri, None, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Server name too long (max 64 characters, got 65)"
    );
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_error_response_format_for_unauthorized() {
    let (_temp, app) = setup_app(Some("secret"), 1024 * 1024);

    let (status, body) = send_request(
        app,
        "POST",
        "/servers/main/snapshot",
        Some(json!([])),
        Some("not-the-secret"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Missing or invalid ingest token"}));
}

#[tokio::test]
async fn test_unauthorized_is_reported_before_validation() {
    let (_temp, app) = setup_app(Some("secret"), 1024 * 1024);

    let (status, body) = send_request(
        app,
        "POST",
        "/servers/no.dots/snapshot",
        Some(json!([])),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Missing or invalid ingest token"}));
}

#[tokio::test]
async fn test_error_response_format_for_unknown_server() {
    let (_temp, app) = setup_app(None, 1024 * 1024);

    let (status, body) = send_request(app, "GET", "/servers/quiet/players", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"error": "Server has not reported any players", "details": "quiet"})
    );
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (_temp, app) = setup_app(None, 1024);
    let records: Vec<Value> = (0..100)
        .map(|i| json!({"name": format!("player-{i}"), "steamIdentifier": format!("steam:{i}")}))
        .collect();

    let (status, _body) = send_request(
        app,
        "POST",
        "/servers/main/snapshot",
        Some(Value::Array(records)),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
