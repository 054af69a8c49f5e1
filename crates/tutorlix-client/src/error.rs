//! Error types for the REST client.

use tutorlix_table::{FetchErrorKind, TableError};

/// Longest response body excerpt kept in a status error.
const MAX_BODY_EXCERPT: usize = 200;

/// Errors raised while talking to a list endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The base URL or endpoint path does not form a valid URL.
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The request never produced a response.
    #[error("Request to {url} failed: {source}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request exceeded the configured timeout.
    #[error("Request to {url} timed out")]
    Timeout {
        /// Requested URL.
        url: String,
    },

    /// The backend answered with a non-success status.
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Start of the response body.
        body: String,
    },

    /// The response body was not a page envelope or a row array.
    #[error("Failed to decode response from {url}: {message}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decoder message.
        message: String,
    },
}

impl ClientError {
    /// Classifies a transport error from `reqwest`.
    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                source,
            }
        }
    }

    /// Builds a status error, keeping only the start of the body.
    pub(crate) fn status(url: &str, status: u16, body: &str) -> Self {
        let body = match body.char_indices().nth(MAX_BODY_EXCERPT) {
            Some((cut, _)) => format!("{}...", &body[..cut]),
            None => body.to_string(),
        };
        Self::Status {
            url: url.to_string(),
            status,
            body,
        }
    }

    /// The fetch failure category this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Transport { .. } => FetchErrorKind::Network,
            Self::Timeout { .. } => FetchErrorKind::Timeout,
            Self::Status { status, .. } if *status >= 500 => FetchErrorKind::Server,
            Self::Status { status, .. } if *status >= 400 => FetchErrorKind::Client,
            Self::Decode { .. } => FetchErrorKind::Decode,
            Self::InvalidUrl { .. } | Self::Build(_) | Self::Status { .. } => FetchErrorKind::Other,
        }
    }
}

impl From<ClientError> for TableError {
    fn from(err: ClientError) -> Self {
        Self::fetch(err.kind(), err.to_string())
    }
}
