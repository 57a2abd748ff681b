//! Error types for registry operations.
//!
//! Provides a unified error type covering filesystem failures, header parse
//! and validation failures, lookup misses, and installer failures. Every
//! variant names the path, identifier or key involved.

use std::io;
use std::path::{Path, PathBuf};

use act_core::{ParseError, ValidationError};
use thiserror::Error;

use crate::install::FetchError;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Filesystem operation failure.
    #[error("I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Header of a single script could not be parsed.
    #[error("failed to parse header of '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// Identifier resolves to no script.
    #[error("script '{0}' not found")]
    NotFound(String),

    /// The content provider could not supply the script.
    #[error("failed to fetch script '{name}': {source}")]
    Fetch {
        name: String,
        #[source]
        source: FetchError,
    },

    /// Required metadata is missing or invalid.
    #[error("script '{}' is invalid: {source}", .path.display())]
    Validation {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    /// Script name is empty or contains disallowed characters.
    #[error("invalid script name '{0}': only letters, digits, '-' and '_' are allowed")]
    InvalidName(String),

    /// A community script with the same file name is already installed.
    #[error("community script '{name}' already exists at '{}'", .path.display())]
    NameCollision { name: String, path: PathBuf },

    /// Refusing to overwrite an existing script.
    #[error("script already exists at '{}'", .0.display())]
    AlreadyExists(PathBuf),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Convenience alias for results with [`RegistryError`].
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Attaches the path an I/O operation was working on.
pub(crate) trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_context_names_path() {
        let err = std::fs::read_to_string("/nonexistent/act/file.py")
            .at(Path::new("/nonexistent/act/file.py"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/act/file.py"));
    }

    #[test]
    fn test_messages_identify_subject() {
        let err = RegistryError::NotFound("community:weather".into());
        assert_eq!(err.to_string(), "script 'community:weather' not found");

        let err = RegistryError::Parse {
            path: PathBuf::from("/s/bad.py"),
            source: ParseError::Unevaluable {
                key: "aliases".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "failed to parse header of '/s/bad.py': unevaluable value for key 'aliases'"
        );
    }
}
