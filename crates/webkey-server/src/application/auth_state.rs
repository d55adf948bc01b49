//! `AuthState`: the PIN authenticator and token store behind one handle.
//!
//! Built once in `main.rs`, wrapped in an `Arc`, and shared by the HTTP
//! handlers, the access guard and every WebSocket session.  Each operation
//! has a `_at` variant taking an explicit clock reading for tests.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use webkey_core::{unix_now, AuthToken, Pin, UnixSeconds};

use super::pin_auth::{AuthError, PinAuthenticator, PinState};
use super::token_store::{PrunedTokens, TokenPersistence, TokenStore};

/// Process-wide authentication state.
pub struct AuthState {
    pin: Mutex<PinAuthenticator>,
    tokens: TokenStore,
    token_ttl: Duration,
}

impl AuthState {
    pub fn new(backend: Box<dyn TokenPersistence>, pin_ttl: Duration, token_ttl: Duration) -> Self {
        Self {
            pin: Mutex::new(PinAuthenticator::new(pin_ttl)),
            tokens: TokenStore::new(backend),
            token_ttl,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub fn pin_state(&self) -> PinState {
        self.lock_pin().state().clone()
    }

    fn lock_pin(&self) -> std::sync::MutexGuard<'_, PinAuthenticator> {
        self.pin.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issues the console PIN.  Called once at startup.
    pub fn issue_pin(&self) -> Pin {
        self.issue_pin_at(unix_now())
    }

    pub fn issue_pin_at(&self, now: UnixSeconds) -> Pin {
        self.lock_pin().issue_pin(now)
    }

    pub fn install_pin_at(&self, pin: Pin, now: UnixSeconds) {
        self.lock_pin().install_pin(pin, now);
    }

    /// Exchanges a submitted PIN for a persisted token.
    pub fn redeem_pin(&self, submitted: &str) -> Result<AuthToken, AuthError> {
        self.redeem_pin_at(submitted, unix_now())
    }

    pub fn redeem_pin_at(&self, submitted: &str, now: UnixSeconds) -> Result<AuthToken, AuthError> {
        self.lock_pin().redeem(submitted, now, &self.tokens)
    }

    /// Accepts `token` only if it survives a fresh prune of the store.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthorized`] for a missing, empty, unknown or expired
    /// token.
    pub fn validate_token(&self, token: Option<&str>) -> Result<(), AuthError> {
        self.validate_token_at(token, unix_now())
    }

    pub fn validate_token_at(&self, token: Option<&str>, now: UnixSeconds) -> Result<(), AuthError> {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(AuthError::Unauthorized),
        };
        let live = self.tokens.load_and_prune(self.token_ttl, now);
        if live.contains(token) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized)
        }
    }

    /// Runs one prune pass, as done at startup.
    pub fn prune_tokens(&self) -> PrunedTokens {
        self.prune_tokens_at(unix_now())
    }

    pub fn prune_tokens_at(&self, now: UnixSeconds) -> PrunedTokens {
        let result = self.tokens.load_and_prune(self.token_ttl, now);
        debug!(
            "token store: {} live, {} pruned",
            result.tokens.len(),
            result.pruned
        );
        result
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
