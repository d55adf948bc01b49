//! Access Guard: decides whether a request or real-time event may proceed.
//!
//! HTTP requests present their token as `Authorization: Bearer <token>`;
//! real-time events carry it in the frame's `token` field.  Cookies and query
//! strings are never consulted.  Every check runs a fresh
//! [`load_and_prune`](super::token_store::TokenStore::load_and_prune) pass,
//! so a token stops working the moment it reaches its TTL.

use std::sync::Arc;

use super::auth_state::AuthState;
use super::pin_auth::AuthError;

/// Paths reachable without a token.
const EXEMPT_PATHS: &[&str] = &["/", "/auth/pin", "/favicon.ico"];

/// Prefix of the static asset tree, also exempt.
const STATIC_PREFIX: &str = "/static/";

/// Whether `path` bypasses the token check.
pub fn is_exempt(path: &str) -> bool {
    EXEMPT_PATHS.contains(&path) || path.starts_with(STATIC_PREFIX) || path == "/static"
}

/// Extracts the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively; an empty token is `None`.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let header = header?.trim();
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Why a request was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Exempt,
    Authorized,
}

/// Token check shared by the HTTP middleware and the WebSocket sessions.
#[derive(Clone)]
pub struct AccessGuard {
    auth: Arc<AuthState>,
}

impl AccessGuard {
    pub fn new(auth: Arc<AuthState>) -> Self {
        Self { auth }
    }

    /// Checks an HTTP request by path and raw `Authorization` header.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthorized`] when a non-exempt path lacks a live token.
    pub fn check_request(
        &self,
        path: &str,
        authorization: Option<&str>,
    ) -> Result<Decision, AuthError> {
        if is_exempt(path) {
            return Ok(Decision::Exempt);
        }
        self.auth.validate_token(bearer_token(authorization))?;
        Ok(Decision::Authorized)
    }

    /// Checks the `token` field of a real-time event.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthorized`] when the token is missing or not live.
    pub fn check_event(&self, token: Option<&str>) -> Result<(), AuthError> {
        self.auth.validate_token(token)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
