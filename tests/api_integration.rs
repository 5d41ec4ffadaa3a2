//! Integration tests for the HTTP API
//!
//! Router clones share one session map, so a flow can span requests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use voicecue::core::create_router;
use voicecue::types::Config;

fn create_test_router() -> Router {
    create_router(Config::default())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn new_session(app: &Router) -> String {
    let (status, json) = send(app, "POST", "/session/new", None).await;
    assert_eq!(status, StatusCode::OK);
    json["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], voicecue::VERSION);
    assert_eq!(json["sessions_active"], 0);
}

#[tokio::test]
async fn test_create_session() {
    let app = create_test_router();
    let (status, json) = send(&app, "POST", "/session/new", None).await;

    assert_eq!(status, StatusCode::OK);
    let id = json["session_id"].as_str().unwrap();
    assert_eq!(json["websocket_url"], format!("/ws/{}", id));

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["sessions_active"], 1);
}

#[tokio::test]
async fn test_session_not_found() {
    let app = create_test_router();
    let (status, _) = send(&app, "GET", "/session/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/session/nonexistent/transcript",
        Some(r#"{"text":"上","is_final":true}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_session_flow() {
    let app = create_test_router();
    let id = new_session(&app).await;

    let (status, json) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["recognizing"], false);
    assert_eq!(json["cue"]["state"], "idle");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/session/{}/control", id),
        Some(r#"{"action":"start"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/session/{}/transcript", id),
        Some(r#"{"text":"左","is_final":true}"#),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, json) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(json["recognizing"], true);
    assert_eq!(json["phase"], "separator");
    assert_eq!(json["cue"]["state"], "awaiting_separator");
    assert_eq!(json["last_committed"], "左");
    assert_eq!(json["reason"], "P002_DIRECTION_ANSWERED");

    send(
        &app,
        "POST",
        &format!("/session/{}/control", id),
        Some(r#"{"action":"next"}"#),
    )
    .await;
    let (_, json) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(json["phase"], "direction");
}

#[tokio::test]
async fn test_offline_resolution_endpoint() {
    let app = create_test_router();
    let id = new_session(&app).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/session/{}/test", id),
        Some(r#"{"text":"上继续下"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phonetic"], "shangjixuxia");
    assert_eq!(json["commands"], serde_json::json!(["up", "continue", "down"]));
    assert_eq!(json["direction_answer"], "down");
    assert_eq!(json["capped"], false);
}

#[tokio::test]
async fn test_unknown_control_action_rejected() {
    let app = create_test_router();
    let id = new_session(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/session/{}/control", id),
        Some(r#"{"action":"rewind"}"#),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_error_report_keeps_session_running() {
    let app = create_test_router();
    let id = new_session(&app).await;
    send(&app, "POST", &format!("/session/{}/control", id), Some(r#"{"action":"start"}"#)).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/session/{}/error", id),
        Some(r#"{"message":"No speech detected"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, json) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(json["recognizing"], true);
}

#[tokio::test]
async fn test_delete_session() {
    let app = create_test_router();
    let id = new_session(&app).await;

    let (status, _) = send(&app, "DELETE", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
