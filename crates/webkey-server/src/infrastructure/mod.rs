//! Infrastructure layer for webkey-server.
//!
//! Contains the OS-facing adapters: the axum HTTP surface, the WebSocket
//! accept loop, token/config file storage, and input injection sinks.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `webkey_core`, but is only imported by `application` from its tests.

pub mod http_server;
pub mod input_sink;
pub mod storage;
pub mod ws_server;

pub use http_server::{build_router, run_http_server, HttpState};
pub use ws_server::{handle_frame, run_ws_listener, run_ws_server, FrameOutcome, RealtimeContext};
