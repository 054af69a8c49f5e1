//! Error types for the Tutorlix table core.
//!
//! This module defines the error hierarchy for table operations, covering
//! configuration loading, list fetches against the backend, and the table
//! driver's command channel.

use std::path::PathBuf;

/// A specialized `Result` type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// Errors that can occur while loading, querying, or driving a table.
///
/// Grouped by where the failure happened. User-facing variants end with a
/// suggestion line.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// `tutorlix.json` is not valid JSON, or has fields of the wrong type.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your tutorlix.json with a JSON linter")]
    ConfigParseError {
        /// Path of the file that failed to parse.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The configuration parsed but holds unusable values.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Fetch Errors
    // ========================================================================
    /// The list endpoint could not produce a page of rows.
    #[error("List fetch failed ({kind}): {message}\n\nSuggestion: {suggestion}")]
    Fetch {
        /// The kind of fetch failure.
        kind: FetchErrorKind,
        /// Detailed error message.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Driver Errors
    // ========================================================================
    /// The table driver has shut down and no longer accepts commands.
    #[error("Table driver is no longer running")]
    TableClosed,

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be converted to or from JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Categories of list fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection refused, DNS failure, or a dropped connection.
    Network,
    /// The request did not complete in time.
    Timeout,
    /// The backend answered with a 4xx status.
    Client,
    /// The backend answered with a 5xx status.
    Server,
    /// The response body was not a page envelope or a row array.
    Decode,
    /// Anything else.
    Other,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Timeout => write!(f, "timeout"),
            Self::Client => write!(f, "client"),
            Self::Server => write!(f, "server"),
            Self::Decode => write!(f, "decode"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl FetchErrorKind {
    /// Returns a suggestion message for this error kind.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::Network => "Check that the backend is running and the base URL is correct",
            Self::Timeout => "Retry, or raise requestTimeoutSecs in your tutorlix.json",
            Self::Client => "Check the endpoint path, filters, and access token",
            Self::Server => "Retry later; the backend may be experiencing issues",
            Self::Decode => "Check that the endpoint returns a paginated list or a JSON array",
            Self::Other => "Re-run with --verbose for more detail",
        }
    }
}

impl TableError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `Fetch` error with a suggestion derived from the kind.
    #[must_use]
    pub fn fetch(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self::Fetch {
            kind,
            message: message.into(),
            suggestion: kind.suggestion().to_string(),
        }
    }

    /// Returns the fetch error kind, if this is a fetch error.
    #[must_use]
    pub const fn fetch_kind(&self) -> Option<FetchErrorKind> {
        match self {
            Self::Fetch { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns `true` if this error is transient and a retry may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Fetch {
                kind: FetchErrorKind::Network | FetchErrorKind::Timeout | FetchErrorKind::Server,
                ..
            }
        )
    }
}
