//! Application layer for webkey-server.
//!
//! # Responsibilities
//!
//! - Issuing the console PIN and exchanging it for bearer tokens
//! - Keeping the token store pruned and persisted
//! - Deciding which requests and events may proceed
//! - Buffering validated events and replaying them in batches
//!
//! # What does NOT belong here?
//!
//! - Sockets, HTTP routing or WebSocket framing (infrastructure)
//! - File formats of the token store (infrastructure)
//! - OS input injection calls (infrastructure)

pub mod access_guard;
pub mod auth_state;
pub mod dispatcher;
pub mod event_queue;
pub mod pin_auth;
pub mod token_store;

pub use access_guard::{bearer_token, is_exempt, AccessGuard, Decision};
pub use auth_state::AuthState;
pub use dispatcher::{
    apply_event, CycleOutcome, Dispatcher, DispatcherConfig, InjectionError, InputSink,
};
pub use event_queue::{EnqueueError, EventQueue, QueueStats};
pub use pin_auth::{AuthError, PinAuthenticator, PinState};
pub use token_store::{PrunedTokens, StoreError, TokenMap, TokenPersistence, TokenStore};
