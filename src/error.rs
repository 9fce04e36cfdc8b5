//! Structured error types for configuration loading.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Document errors
    ParseError,
    IoError,

    // Include errors
    CyclicInclude,
    IllegalNestedInclude,

    // Value errors
    ValidationError,
    InvalidPath,
    InvalidOverride,
}

/// Fatal failures raised while loading or mutating a configuration.
///
/// Missing include targets and failed scalar coercions are not errors: they
/// degrade to a skip or a default value and never reach the caller.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {} cannot include itself", path.display())]
    CyclicInclude { path: PathBuf },

    #[error(
        "included config file {} declares '{key}', only the main config file can include other files",
        path.display()
    )]
    IllegalNestedInclude { path: PathBuf, key: String },

    #[error("invalid value for '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("invalid config path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid command-line option '{option}': expected key=value")]
    InvalidOverride { option: String },
}

impl ConfigError {
    pub fn parse(source_name: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: err.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::Parse { .. } => ErrorCode::ParseError,
            ConfigError::Io { .. } => ErrorCode::IoError,
            ConfigError::CyclicInclude { .. } => ErrorCode::CyclicInclude,
            ConfigError::IllegalNestedInclude { .. } => ErrorCode::IllegalNestedInclude,
            ConfigError::Validation { .. } => ErrorCode::ValidationError,
            ConfigError::InvalidPath { .. } => ErrorCode::InvalidPath,
            ConfigError::InvalidOverride { .. } => ErrorCode::InvalidOverride,
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
