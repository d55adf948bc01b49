//! Storage infrastructure.
//!
//! - `token_file` persists the token map as a JSON object, replaced
//!   atomically on every write.
//! - `memory` keeps the map in process memory, for tests and benchmarks.
//! - `config` reads the optional TOML configuration file.

pub mod config;
pub mod memory;
pub mod token_file;

pub use config::{load_config, ConfigError, FileConfig};
pub use memory::InMemoryTokens;
pub use token_file::JsonTokenFile;
