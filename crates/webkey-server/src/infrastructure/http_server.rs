//! HTTP surface: landing page, PIN exchange and `POST /key_event`.
//!
//! # Routes
//!
//! | Method | Path          | Auth   | Reply                                    |
//! |--------|---------------|--------|------------------------------------------|
//! | GET    | `/`           | exempt | landing page                             |
//! | GET    | `/static/*`   | exempt | files from the configured static dir     |
//! | POST   | `/auth/pin`   | exempt | `200` token, `401` bad PIN, `400`, `500` |
//! | POST   | `/key_event`  | bearer | `200`, `400`, `401`, `500`, `503`        |
//!
//! Every request passes through [`require_token`], which asks the
//! [`AccessGuard`] before the route runs.  `/key_event` goes through the
//! same [`EventQueue`] as the real-time channel, so HTTP and WebSocket input
//! is replayed in one arrival order.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use webkey_core::protocol::messages::{KeyEventPayload, PinAuthRequest};
use webkey_core::{ApiReply, Key};

use crate::application::access_guard::AccessGuard;
use crate::application::auth_state::AuthState;
use crate::application::event_queue::EventQueue;
use crate::application::pin_auth::AuthError;

/// Placeholder in `index.html` replaced with the real-time port.
pub const WS_PORT_PLACEHOLDER: &str = "{{WS_PORT}}";

const LANDING_PAGE_TEMPLATE: &str = include_str!("../../static/index.html");

const MALFORMED_BODY_MESSAGE: &str = "Malformed request body";

/// How often graceful shutdown polls the `running` flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Shared state of every HTTP handler.
#[derive(Clone)]
pub struct HttpState {
    pub auth: Arc<AuthState>,
    pub guard: AccessGuard,
    pub queue: Arc<EventQueue>,
    pub landing_page: Arc<str>,
}

impl HttpState {
    pub fn new(auth: Arc<AuthState>, queue: Arc<EventQueue>, ws_port: u16) -> Self {
        Self {
            guard: AccessGuard::new(Arc::clone(&auth)),
            auth,
            queue,
            landing_page: render_landing_page(ws_port).into(),
        }
    }
}

/// The landing page with the real-time port filled in.
pub fn render_landing_page(ws_port: u16) -> String {
    LANDING_PAGE_TEMPLATE.replace(WS_PORT_PLACEHOLDER, &ws_port.to_string())
}

/// Builds the router with the token middleware and request tracing.
pub fn build_router(state: HttpState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/auth/pin", post(auth_pin))
        .route("/key_event", post(key_event))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `router` on `listener` until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn run_http_server(
    listener: TcpListener,
    router: Router,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let addr = listener
        .local_addr()
        .context("HTTP listener has no local address")?;
    info!("HTTP server listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown(running))
        .await
        .with_context(|| format!("HTTP server on {addr} failed"))?;

    info!("HTTP server stopped");
    Ok(())
}

async fn wait_for_shutdown(running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(SHUTDOWN_POLL).await;
    }
}

// ── Middleware ────────────────────────────────────────────────────────────────

/// Rejects non-exempt requests that lack a live bearer token.
async fn require_token(State(state): State<HttpState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    // The check reads (and may rewrite) the token file.
    let guard = state.guard.clone();
    let checked_path = path.clone();
    let checked = tokio::task::spawn_blocking(move || {
        guard.check_request(&checked_path, authorization.as_deref())
    })
    .await;

    match checked {
        Ok(Ok(decision)) => {
            debug!("{path}: {decision:?}");
            next.run(request).await
        }
        Ok(Err(e)) => {
            warn!("rejected request to {path}: {e}");
            (StatusCode::UNAUTHORIZED, Json(ApiReply::unauthorized())).into_response()
        }
        Err(e) => {
            error!("token check for {path} did not complete: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiReply::error("Token check failed")),
            )
                .into_response()
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn landing_page(State(state): State<HttpState>) -> Html<String> {
    Html(state.landing_page.to_string())
}

async fn auth_pin(
    State(state): State<HttpState>,
    body: Result<Json<PinAuthRequest>, JsonRejection>,
) -> (StatusCode, Json<ApiReply>) {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("malformed PIN request: {rejection}");
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiReply::error(MALFORMED_BODY_MESSAGE)),
            );
        }
    };

    let Some(pin) = request.pin else {
        warn!("PIN request without a pin field");
        return (StatusCode::UNAUTHORIZED, Json(ApiReply::invalid_pin()));
    };

    let auth = Arc::clone(&state.auth);
    let redeemed = tokio::task::spawn_blocking(move || auth.redeem_pin(&pin)).await;

    match redeemed {
        Ok(Ok(token)) => (
            StatusCode::OK,
            Json(ApiReply::with_token(token.into_string())),
        ),
        Ok(Err(AuthError::Persistence(e))) => {
            error!("could not persist new token: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiReply::error("Could not store token")),
            )
        }
        Ok(Err(_)) => (StatusCode::UNAUTHORIZED, Json(ApiReply::invalid_pin())),
        Err(e) => {
            error!("PIN exchange did not complete: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiReply::error("Could not store token")),
            )
        }
    }
}

async fn key_event(
    State(state): State<HttpState>,
    body: Result<Json<KeyEventPayload>, JsonRejection>,
) -> (StatusCode, Json<ApiReply>) {
    let Json(payload) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("malformed key_event: {rejection}");
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiReply::error(MALFORMED_BODY_MESSAGE)),
            );
        }
    };

    // Unknown names are the one injection error detectable before queuing.
    if let Err(e) = Key::resolve(&payload.key) {
        warn!("key_event rejected: {e}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiReply::error(e.to_string())),
        );
    }

    match state.queue.push(payload.into()) {
        Ok(()) => (StatusCode::OK, Json(ApiReply::ok())),
        Err(e) => {
            warn!("key_event dropped: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiReply::error(e.to_string())),
            )
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_page_contains_ws_port() {
        // Arrange / Act
        let page = render_landing_page(18001);

        // Assert
        assert!(page.contains("18001"));
        assert!(!page.contains(WS_PORT_PLACEHOLDER));
    }

    #[test]
    fn test_template_has_placeholder() {
        assert!(LANDING_PAGE_TEMPLATE.contains(WS_PORT_PLACEHOLDER));
    }
}
