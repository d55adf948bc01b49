//! Token Store: issued bearer tokens and their creation times.
//!
//! The store keeps an in-memory copy of the token map and mirrors it to a
//! [`TokenPersistence`] backend (the JSON token file in production).  The
//! backend is the source of truth: every validation pass reloads it through
//! [`TokenStore::load_and_prune`], drops entries that reached the TTL, and
//! writes the result back only when something was dropped.
//!
//! All read-modify-write sequences run under one mutex, so concurrent
//! validations and PIN redemptions never interleave their file writes.
//!
//! # Failure policy
//!
//! - A backend that cannot be read yields an empty map.
//! - A failed rewrite after pruning is logged and the pruned map is still
//!   returned.
//! - A failed write in [`TokenStore::add`] is returned to the caller and the
//!   token is rolled back, so no one receives a token that was not persisted.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, warn};

use webkey_core::{AuthToken, UnixSeconds};

/// Issued tokens keyed by value, each with its creation time.
pub type TokenMap = BTreeMap<AuthToken, UnixSeconds>;

/// Error type for token persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error accessing token file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token file {path} is not a JSON object of timestamps: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode token map: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable storage for the token map.
///
/// Implementations live in `infrastructure::storage`.
#[cfg_attr(test, mockall::automock)]
pub trait TokenPersistence: Send {
    /// Reads the whole map.  A missing artifact is an empty map, not an error.
    fn load(&self) -> Result<TokenMap, StoreError>;

    /// Replaces the stored map atomically.
    fn save(&self, tokens: &TokenMap) -> Result<(), StoreError>;

    /// Deletes the stored artifact.
    fn wipe(&self) -> Result<(), StoreError>;
}

/// Result of one [`TokenStore::load_and_prune`] pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrunedTokens {
    /// Tokens still inside their TTL.
    pub tokens: TokenMap,
    /// How many entries this pass removed.
    pub pruned: usize,
}

impl PrunedTokens {
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains_key(token)
    }
}

struct StoreState {
    backend: Box<dyn TokenPersistence>,
    tokens: TokenMap,
}

/// Thread-safe token store shared by every request handler.
///
/// Every method does blocking file I/O under a `std::sync::Mutex`.  Async
/// callers run it through `tokio::task::spawn_blocking`.
pub struct TokenStore {
    inner: Mutex<StoreState>,
}

impl TokenStore {
    /// Creates a store over `backend`.  Nothing is read until the first call.
    pub fn new(backend: Box<dyn TokenPersistence>) -> Self {
        Self {
            inner: Mutex::new(StoreState {
                backend,
                tokens: TokenMap::new(),
            }),
        }
    }

    // A panic while holding the lock leaves the map in a consistent state
    // (every mutation is a single insert/remove/assign), so poison is ignored.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads the backend without pruning.
    ///
    /// Unreadable or malformed storage is reported as an empty map.
    pub fn load(&self) -> TokenMap {
        let mut state = self.lock();
        let tokens = read_or_empty(state.backend.as_ref());
        state.tokens = tokens.clone();
        tokens
    }

    /// Reloads the backend and drops every token with `now - created >= ttl`.
    ///
    /// The backend is rewritten only when at least one entry was dropped.
    pub fn load_and_prune(&self, ttl: Duration, now: UnixSeconds) -> PrunedTokens {
        let ttl_secs = ttl.as_secs_f64();
        let mut state = self.lock();

        let loaded = read_or_empty(state.backend.as_ref());
        let before = loaded.len();
        let tokens: TokenMap = loaded
            .into_iter()
            .filter(|(_, created)| now - *created < ttl_secs)
            .collect();
        let pruned = before - tokens.len();

        if pruned > 0 {
            debug!("pruned {pruned} expired token(s)");
            if let Err(e) = state.backend.save(&tokens) {
                error!("failed to rewrite token file after pruning: {e}");
            }
        }

        state.tokens = tokens.clone();
        PrunedTokens { tokens, pruned }
    }

    /// Records `token` as created at `now` and persists the map.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StoreError`] when the write fails.  The token
    /// is removed from memory again in that case.
    pub fn add(&self, token: AuthToken, now: UnixSeconds) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.tokens.insert(token.clone(), now);
        let result = state.backend.save(&state.tokens);
        if result.is_err() {
            state.tokens.remove(&token);
        }
        result
    }

    /// Deletes the durable artifact and forgets every token.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StoreError`] when deletion fails.
    pub fn wipe(&self) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.tokens.clear();
        state.backend.wipe()
    }

    /// Whether `token` is in the in-memory copy (as of the last load or add).
    pub fn contains(&self, token: &str) -> bool {
        self.lock().tokens.contains_key(token)
    }

    /// A copy of the in-memory map.
    pub fn snapshot(&self) -> TokenMap {
        self.lock().tokens.clone()
    }
}

fn read_or_empty(backend: &dyn TokenPersistence) -> TokenMap {
    match backend.load() {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!("treating token store as empty: {e}");
            TokenMap::new()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
