//! JSON token file.
//!
//! The file is a single JSON object mapping each token to its creation time
//! in Unix seconds, indented with four spaces:
//!
//! ```json
//! {
//!     "5b1f6a2e-3c4d-4e5f-8a9b-0c1d2e3f4a5b": 1712345678.123
//! }
//! ```
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the target, so a crash mid-write leaves either the old or the new
//! file, never a truncated one.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;

use crate::application::token_store::{StoreError, TokenMap, TokenPersistence};

/// [`TokenPersistence`] backed by one JSON file.
#[derive(Debug, Clone)]
pub struct JsonTokenFile {
    path: PathBuf,
}

impl JsonTokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Directory that receives the temporary file.  A bare file name means
    /// the working directory.
    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl TokenPersistence for JsonTokenFile {
    fn load(&self) -> Result<TokenMap, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
                    path: self.path.clone(),
                    source,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TokenMap::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, tokens: &TokenMap) -> Result<(), StoreError> {
        let mut tmp = NamedTempFile::new_in(self.parent_dir()).map_err(|e| self.io_error(e))?;

        {
            let mut ser = serde_json::Serializer::with_formatter(
                tmp.as_file_mut(),
                PrettyFormatter::with_indent(b"    "),
            );
            tokens.serialize(&mut ser)?;
        }
        tmp.as_file_mut()
            .write_all(b"\n")
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| self.io_error(e))?;

        tmp.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;
        Ok(())
    }

    fn wipe(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use webkey_core::AuthToken;

    fn sample() -> TokenMap {
        [
            (AuthToken::from("alpha"), 1_712_345_678.125),
            (AuthToken::from("beta"), 1_712_345_999.5),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_missing_file_loads_as_empty() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let file = JsonTokenFile::new(dir.path().join("authorized_tokens.json"));

        // Act / Assert
        assert!(file.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_returns_same_map() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let file = JsonTokenFile::new(dir.path().join("authorized_tokens.json"));

        // Act
        file.save(&sample()).unwrap();

        // Assert
        assert_eq!(file.load().unwrap(), sample());
    }

    #[test]
    fn test_saved_file_is_a_four_space_indented_object() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let file = JsonTokenFile::new(dir.path().join("authorized_tokens.json"));

        // Act
        file.save(&sample()).unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();

        // Assert
        assert!(content.starts_with("{\n    \"alpha\": 1712345678.125"));
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(value.is_object());
    }

    #[test]
    fn test_save_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonTokenFile::new(dir.path().join("authorized_tokens.json"));
        file.save(&sample()).unwrap();

        file.save(&TokenMap::new()).unwrap();

        assert!(file.load().unwrap().is_empty());
        // Only the target file is left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_malformed_file_is_reported() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authorized_tokens.json");
        std::fs::write(&path, "[\"not\", \"an\", \"object\"]").unwrap();

        // Act
        let result = JsonTokenFile::new(&path).load();

        // Assert
        assert!(matches!(result, Err(StoreError::Malformed { .. })));
    }

    #[test]
    fn test_wipe_removes_file_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonTokenFile::new(dir.path().join("authorized_tokens.json"));
        file.save(&sample()).unwrap();

        file.wipe().unwrap();
        file.wipe().unwrap();

        assert!(!file.path().exists());
    }
}
