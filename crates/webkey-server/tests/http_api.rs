//! Integration tests for the HTTP surface.
//!
//! Requests are sent straight into the axum [`Router`] with
//! `tower::ServiceExt::oneshot`, so no socket is bound.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use webkey_core::{unix_now, AuthToken, InputEvent, KeyAction, Pin};
use webkey_server::application::{AuthState, EventQueue, TokenMap};
use webkey_server::infrastructure::storage::InMemoryTokens;
use webkey_server::infrastructure::{build_router, HttpState};

const WS_PORT: u16 = 18001;
const LIVE_TOKEN: &str = "live-token";

struct Harness {
    router: Router,
    auth: Arc<AuthState>,
    queue: Arc<EventQueue>,
}

fn harness_with(max_pending: usize, static_dir: &Path) -> Harness {
    let tokens: TokenMap = [(AuthToken::from(LIVE_TOKEN), unix_now())]
        .into_iter()
        .collect();
    let auth = Arc::new(AuthState::new(
        Box::new(InMemoryTokens::with_tokens(tokens)),
        Duration::from_secs(300),
        Duration::from_secs(7 * 86_400),
    ));
    let queue = Arc::new(EventQueue::new(max_pending));
    let state = HttpState::new(Arc::clone(&auth), Arc::clone(&queue), WS_PORT);
    Harness {
        router: build_router(state, static_dir),
        auth,
        queue,
    }
}

fn harness() -> Harness {
    harness_with(64, Path::new("static"))
}

fn json_post(uri: &str, body: Value, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(router, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ── Landing page and static assets ────────────────────────────────────────────

#[tokio::test]
async fn test_landing_page_is_served_without_token() {
    // Arrange
    let h = harness();
    let request = Request::get("/").body(Body::empty()).unwrap();

    // Act
    let (status, body) = send(&h.router, request).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let page = String::from_utf8(body).unwrap();
    assert!(page.contains(&WS_PORT.to_string()));
    assert!(!page.contains("{{WS_PORT}}"));
}

#[tokio::test]
async fn test_static_files_are_exempt() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("js")).unwrap();
    std::fs::write(dir.path().join("js").join("main.js"), "console.log(1);").unwrap();
    let h = harness_with(64, dir.path());
    let request = Request::get("/static/js/main.js").body(Body::empty()).unwrap();

    // Act
    let (status, body) = send(&h.router, request).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"console.log(1);");
}

#[tokio::test]
async fn test_protected_route_without_token_is_unauthorized() {
    let h = harness();
    let request = Request::get("/key_event").body(Body::empty()).unwrap();
    let (status, body) = send_json(&h.router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"status": "error", "message": "Unauthorized"}));
}

// ── PIN exchange ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_correct_pin_returns_a_working_token() {
    // Arrange
    let h = harness();
    h.auth.install_pin_at(Pin::from_number(42_917), unix_now());

    // Act
    let (status, body) =
        send_json(&h.router, json_post("/auth/pin", json!({"pin": "042917"}), None)).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let token = body["token"].as_str().unwrap().to_string();
    assert!(h.auth.validate_token(Some(&token)).is_ok());

    let (status, _) = send_json(
        &h.router,
        json_post("/key_event", json!({"key": "a", "action": "down"}), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reused_pin_is_rejected() {
    // Arrange
    let h = harness();
    h.auth.install_pin_at(Pin::from_number(42_917), unix_now());
    send_json(&h.router, json_post("/auth/pin", json!({"pin": "042917"}), None)).await;

    // Act
    let (status, body) =
        send_json(&h.router, json_post("/auth/pin", json!({"pin": "042917"}), None)).await;

    // Assert
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"status": "error", "message": "Invalid or expired PIN"})
    );
}

#[tokio::test]
async fn test_missing_pin_field_is_invalid_pin() {
    let h = harness();
    h.auth.install_pin_at(Pin::from_number(1), unix_now());
    let (status, body) = send_json(&h.router, json_post("/auth/pin", json!({}), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired PIN");
}

#[tokio::test]
async fn test_non_json_pin_body_is_bad_request() {
    // Arrange
    let h = harness();
    let request = Request::post("/auth/pin")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("pin=123456"))
        .unwrap();

    // Act
    let (status, body) = send_json(&h.router, request).await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

// ── key_event ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_key_event_is_queued() {
    // Arrange
    let h = harness();

    // Act
    let (status, body) = send_json(
        &h.router,
        json_post(
            "/key_event",
            json!({"key": "enter", "action": "up"}),
            Some(LIVE_TOKEN),
        ),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success"}));
    assert_eq!(
        h.queue.drain_all(),
        vec![InputEvent::key("enter", KeyAction::Up)]
    );
}

#[tokio::test]
async fn test_key_event_without_token_is_unauthorized_and_not_queued() {
    let h = harness();
    let (status, _) = send_json(
        &h.router,
        json_post("/key_event", json!({"key": "a", "action": "down"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(h.queue.is_empty());
}

#[tokio::test]
async fn test_key_event_with_unknown_token_is_unauthorized() {
    let h = harness();
    let (status, _) = send_json(
        &h.router,
        json_post("/key_event", json!({"key": "a", "action": "down"}), Some("forged")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_key_event_with_unresolvable_key_is_server_error() {
    // Arrange
    let h = harness();

    // Act
    let (status, body) = send_json(
        &h.router,
        json_post(
            "/key_event",
            json!({"key": "hyper", "action": "down"}),
            Some(LIVE_TOKEN),
        ),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("hyper"));
    assert!(h.queue.is_empty());
}

#[tokio::test]
async fn test_key_event_with_missing_action_is_bad_request() {
    let h = harness();
    let (status, _) = send_json(
        &h.router,
        json_post("/key_event", json!({"key": "a"}), Some(LIVE_TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_key_event_on_full_queue_is_service_unavailable() {
    // Arrange
    let h = harness_with(1, Path::new("static"));
    let key = || json_post("/key_event", json!({"key": "a", "action": "down"}), Some(LIVE_TOKEN));

    // Act
    let (first, _) = send_json(&h.router, key()).await;
    let (second, body) = send_json(&h.router, key()).await;

    // Assert
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
    assert_eq!(h.queue.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_key_events_are_all_checked_and_queued() {
    // Arrange
    let h = harness();

    // Act
    let requests: Vec<_> = (0..16)
        .map(|_| {
            let router = h.router.clone();
            tokio::spawn(async move {
                let request =
                    json_post("/key_event", json!({"key": "a", "action": "down"}), Some(LIVE_TOKEN));
                send(&router, request).await.0
            })
        })
        .collect();
    let mut statuses = Vec::new();
    for request in requests {
        statuses.push(request.await.unwrap());
    }

    // Assert
    assert!(statuses.iter().all(|status| *status == StatusCode::OK));
    assert_eq!(h.queue.len(), 16);
}
