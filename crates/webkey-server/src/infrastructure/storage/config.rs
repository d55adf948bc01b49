//! TOML configuration file.
//!
//! Every setting can also be given on the command line or through a
//! `WEBKEY_*` environment variable; those win over the file, and the file
//! wins over the built-in defaults.  Example:
//!
//! ```toml
//! [http]
//! bind = "0.0.0.0"
//! port = 18000
//! static_dir = "/usr/share/webkey/static"
//!
//! [realtime]
//! port = 18001
//!
//! [auth]
//! token_file = "authorized_tokens.json"
//! token_ttl_secs = 604800
//! pin_ttl_secs = 300
//! wipe_tokens_on_exit = false
//!
//! [dispatch]
//! merge_window_ms = 5
//! idle_backoff_ms = 1
//! max_pending = 4096
//! sink = "log"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Missing sections and fields take their defaults, so an empty file is a
//! valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::config::BUNDLED_STATIC_DIR;
use crate::domain::SinkKind;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// Top-level layout of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub realtime: RealtimeSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub dispatch: DispatchSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpSection {
    /// IP address both listeners bind to.
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RealtimeSection {
    #[serde(default = "default_ws_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSection {
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default = "default_pin_ttl_secs")]
    pub pin_ttl_secs: u64,
    #[serde(default)]
    pub wipe_tokens_on_exit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchSection {
    #[serde(default = "default_merge_window_ms")]
    pub merge_window_ms: u64,
    #[serde(default = "default_idle_backoff_ms")]
    pub idle_backoff_ms: u64,
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
    #[serde(default)]
    pub sink: SinkKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    18000
}
fn default_static_dir() -> PathBuf {
    PathBuf::from(BUNDLED_STATIC_DIR)
}
fn default_ws_port() -> u16 {
    18001
}
fn default_token_file() -> PathBuf {
    PathBuf::from("authorized_tokens.json")
}
fn default_token_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}
fn default_pin_ttl_secs() -> u64 {
    300
}
fn default_merge_window_ms() -> u64 {
    5
}
fn default_idle_backoff_ms() -> u64 {
    1
}
fn default_max_pending() -> usize {
    4096
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_http_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for RealtimeSection {
    fn default() -> Self {
        Self {
            port: default_ws_port(),
        }
    }
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
            token_ttl_secs: default_token_ttl_secs(),
            pin_ttl_secs: default_pin_ttl_secs(),
            wipe_tokens_on_exit: false,
        }
    }
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            merge_window_ms: default_merge_window_ms(),
            idle_backoff_ms: default_idle_backoff_ms(),
            max_pending: default_max_pending(),
            sink: SinkKind::default(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads `path`, or returns the defaults when `path` is `None`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when an explicitly named file cannot be read
/// (including when it does not exist) and [`ConfigError::Parse`] when the
/// TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
