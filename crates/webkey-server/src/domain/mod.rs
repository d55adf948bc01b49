//! Domain layer for webkey-server.
//!
//! Plain configuration values with no I/O.  Populating them from the command
//! line, the environment or a TOML file happens in `main.rs` and
//! `infrastructure::storage::config`.

pub mod config;

pub use config::{ServerConfig, SinkKind, UnknownSinkKind};
