//! In-process token storage.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::application::token_store::{StoreError, TokenMap, TokenPersistence};

/// [`TokenPersistence`] that keeps the map in memory.
///
/// Clones share the same map, so a test can hand one clone to the store and
/// inspect the other.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokens {
    tokens: Arc<Mutex<TokenMap>>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts out holding `tokens`.
    pub fn with_tokens(tokens: TokenMap) -> Self {
        Self {
            tokens: Arc::new(Mutex::new(tokens)),
            writes: Arc::default(),
        }
    }

    /// The currently stored map.
    pub fn stored(&self) -> TokenMap {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of successful `save` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl TokenPersistence for InMemoryTokens {
    fn load(&self) -> Result<TokenMap, StoreError> {
        Ok(self.stored())
    }

    fn save(&self, tokens: &TokenMap) -> Result<(), StoreError> {
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) = tokens.clone();
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn wipe(&self) -> Result<(), StoreError> {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
