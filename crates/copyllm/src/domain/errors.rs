//! Domain-specific errors.

use thiserror::Error;

/// Error returned when a resource locator cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceParseError {
    #[error("empty resource locator")]
    Empty,
    #[error("invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },
    #[error("file URI '{0}' does not name a local path")]
    MissingPath(String),
}
