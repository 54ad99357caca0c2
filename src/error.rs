//! Structured error types for configuration resolution.
//!
//! Every variant is fatal: the caller must abort before any business logic
//! or log-file creation happens.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ConfigNotFound,
    ConfigParseError,
    ConfigDecryptionError,
    ConfigValidationError,
}

/// Fatal error raised while resolving a configuration tree.
///
/// Messages never carry secret plaintext or ciphertext.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A referenced document does not exist.
    #[error("config file does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    /// A document could not be parsed into a structured mapping.
    #[error("failed to parse config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// The key store is unavailable or a tagged value failed to decrypt.
    #[error("failed to decrypt secret: {message}")]
    Decryption { message: String },

    /// A required structural key is missing or invalid.
    #[error("invalid configuration: {field}: {message}")]
    Validation { field: String, message: String },
}

impl ConfigError {
    pub fn not_found(path: impl AsRef<Path>) -> Self {
        Self::NotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn parse(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn decryption(message: impl Into<String>) -> Self {
        Self::Decryption {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The programmatic code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::NotFound { .. } => ErrorCode::ConfigNotFound,
            ConfigError::Parse { .. } => ErrorCode::ConfigParseError,
            ConfigError::Decryption { .. } => ErrorCode::ConfigDecryptionError,
            ConfigError::Validation { .. } => ErrorCode::ConfigValidationError,
        }
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_variants() {
        assert_eq!(
            ConfigError::not_found("a.yaml").code(),
            ErrorCode::ConfigNotFound
        );
        assert_eq!(
            ConfigError::parse("a.yaml", "bad").code(),
            ErrorCode::ConfigParseError
        );
        assert_eq!(
            ConfigError::decryption("bad token").code(),
            ErrorCode::ConfigDecryptionError
        );
        assert_eq!(
            ConfigError::validation("logging.log_dir", "missing").code(),
            ErrorCode::ConfigValidationError
        );
    }

    #[test]
    fn test_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::ConfigNotFound).unwrap();
        assert_eq!(json, "\"CONFIG_NOT_FOUND\"");
    }

    #[test]
    fn test_display_includes_path() {
        let err = ConfigError::not_found("conf/missing.yaml");
        assert!(err.to_string().contains("conf/missing.yaml"));
    }
}
