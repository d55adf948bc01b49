//! Server configuration types.
//!
//! [`ServerConfig`] holds every runtime setting after the command line, the
//! environment and the optional TOML file have been merged.  It is built once
//! at startup and handed to the component that needs each part.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The browser client shipped with this crate (`index.html`, `js/main.js`).
///
/// Absolute, so `/static` resolves no matter which directory the server is
/// started from.
pub const BUNDLED_STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Which [`InputSink`](crate::application::dispatcher::InputSink) the
/// dispatcher drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Log every action instead of injecting it.
    #[default]
    Log,
    /// Inject through the X11 XTest extension (Linux, `xtest` feature).
    Xtest,
}

/// Error returned when a sink name is neither `log` nor `xtest`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sink {0:?} (expected \"log\" or \"xtest\")")]
pub struct UnknownSinkKind(pub String);

impl FromStr for SinkKind {
    type Err = UnknownSinkKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "log" => Ok(SinkKind::Log),
            "xtest" => Ok(SinkKind::Xtest),
            _ => Err(UnknownSinkKind(s.to_string())),
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SinkKind::Log => "log",
            SinkKind::Xtest => "xtest",
        })
    }
}

/// All runtime configuration for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address of the HTTP listener (landing page, PIN exchange, key_event).
    pub http_addr: SocketAddr,

    /// Address of the real-time WebSocket listener.
    pub ws_addr: SocketAddr,

    /// JSON file holding issued tokens and their creation times.
    pub token_file: PathBuf,

    /// Age at which a token stops being accepted.
    pub token_ttl: Duration,

    /// How long the console PIN can be redeemed after startup.
    pub pin_ttl: Duration,

    /// Minimum duration of one dispatcher cycle that applied events.
    pub merge_window: Duration,

    /// Sleep between polls of an empty queue.
    pub idle_backoff: Duration,

    /// Events held in the queue before new ones are dropped.
    pub max_pending: usize,

    /// Directory served under `/static`.
    pub static_dir: PathBuf,

    pub sink: SinkKind,

    /// Delete the token file on clean shutdown.
    pub wipe_tokens_on_exit: bool,

    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    /// | Field               | Default                  |
    /// |---------------------|--------------------------|
    /// | http_addr           | `0.0.0.0:18000`          |
    /// | ws_addr             | `0.0.0.0:18001`          |
    /// | token_file          | `authorized_tokens.json` |
    /// | token_ttl           | 7 days                   |
    /// | pin_ttl             | 300 seconds              |
    /// | merge_window        | 5 ms                     |
    /// | idle_backoff        | 1 ms                     |
    /// | max_pending         | 4096                     |
    /// | static_dir          | [`BUNDLED_STATIC_DIR`]   |
    /// | sink                | `log`                    |
    /// | wipe_tokens_on_exit | `false`                  |
    /// | log_level           | `info`                   |
    fn default() -> Self {
        let any = std::net::Ipv4Addr::UNSPECIFIED;
        Self {
            http_addr: SocketAddr::from((any, 18000)),
            ws_addr: SocketAddr::from((any, 18001)),
            token_file: PathBuf::from("authorized_tokens.json"),
            token_ttl: webkey_core::auth::DEFAULT_TOKEN_TTL,
            pin_ttl: webkey_core::auth::DEFAULT_PIN_TTL,
            merge_window: Duration::from_millis(5),
            idle_backoff: Duration::from_millis(1),
            max_pending: 4096,
            static_dir: PathBuf::from(BUNDLED_STATIC_DIR),
            sink: SinkKind::Log,
            wipe_tokens_on_exit: false,
            log_level: "info".to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
