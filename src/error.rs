//! Error types for the updater settings core
//!
//! Most store operations are treated as always-succeeding by the session, so
//! the variants here mostly surface at the edges: the access guard, loading
//! build defaults, the on-disk backend and CLI input parsing.

use std::path::PathBuf;

/// Errors that can occur while managing updater settings
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The execution context is not the privileged account
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// I/O error during storage operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted settings file could not be encoded or decoded
    #[error("Settings file error: {0}")]
    Json(#[from] serde_json::Error),

    /// Build defaults could not be parsed
    #[error("Invalid defaults configuration: {0}")]
    Config(String),

    /// A defaults file could not be read
    #[error("Defaults file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// A user-supplied value does not fit the setting
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Invalid glob pattern in query
    #[error("Invalid glob pattern: {0}")]
    InvalidGlobPattern(String),
}

/// Result type alias for convenience
///
/// ```rust
/// use updater_settings::{canonicalize, Result};
///
/// fn current(raw: &str) -> Result<String> {
///     Ok(canonicalize(raw))
/// }
/// # assert_eq!(current("stable").unwrap(), "stable6");
/// ```
pub type Result<T> = std::result::Result<T, Error>;
