//! webkey-server library crate.
//!
//! Serves the browser client, exchanges the console PIN for bearer tokens,
//! and replays authorized keyboard and pointer events on the host.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser ── HTTP (axum) ───────┐
//!         └─ WebSocket (tungstenite)
//!                               ▼
//! [webkey-server]
//!   ├── domain/           ServerConfig
//!   ├── application/      token store, PIN exchange, access guard,
//!   │                     event queue, batching dispatcher
//!   └── infrastructure/
//!         ├── http_server  axum router and bearer middleware
//!         ├── ws_server    real-time accept loop
//!         ├── storage/     token file, TOML config
//!         └── input_sink/  tracing, recording and XTest sinks
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `webkey-core`; persistence and
//!   input injection are reached through the [`TokenPersistence`] and
//!   [`InputSink`] traits.
//! - `infrastructure` implements those traits and owns every socket.
//!
//! [`TokenPersistence`]: application::token_store::TokenPersistence
//! [`InputSink`]: application::dispatcher::InputSink

/// Domain layer: configuration types.
pub mod domain;

/// Application layer: authentication and the event pipeline.
pub mod application;

/// Infrastructure layer: HTTP, WebSocket, storage and input sinks.
pub mod infrastructure;
