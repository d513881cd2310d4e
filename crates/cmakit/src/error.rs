//! Error types for Contentful Management API operations.
//!
//! Errors are categorized so callers can tell an expected outcome (a resource
//! that is simply absent) from a failure that must be reported. Nothing in this
//! crate retries: a stale version surfaces as [`Error::Conflict`] so that
//! intervening remote changes are never overwritten blindly.

use serde::Deserialize;
use thiserror::Error;

/// Categories of API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Resource is absent remotely
    NotFound,
    /// Optimistic-concurrency version mismatch
    Conflict,
    /// Payload rejected by the server
    Validation,
    /// Network, TLS or authentication failure
    Transport,
    /// Caller cancelled the operation
    Cancelled,
    /// Other/unknown errors
    Other,
}

/// Errors that can occur while talking to the Management API.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Resource does not exist
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Resource kind (`Entry`, `ContentType`, ...)
        kind: String,
        /// ID that was looked up
        id: String,
    },

    /// Version mismatch on a write
    #[error("version conflict: {message}")]
    Conflict {
        /// Server message
        message: String,
    },

    /// Payload rejected by the server
    #[error("validation failed: {message}")]
    Validation {
        /// Server message, verbatim
        message: String,
    },

    /// Network or authentication failure
    #[error("transport error: {message}")]
    Transport {
        /// Underlying client message
        message: String,
    },

    /// Any other non-success HTTP status
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Server message
        message: String,
    },

    /// Cancellation was requested before the call ran
    #[error("operation cancelled")]
    Cancelled,

    /// Response body could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Client configuration is incomplete
    #[error("configuration error: {0}")]
    Config(String),
}

/// Error body returned by the Management API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::Validation { .. } => ErrorCategory::Validation,
            Error::Transport { .. } => ErrorCategory::Transport,
            Error::Cancelled => ErrorCategory::Cancelled,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether the resource is absent remotely.
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    pub fn not_found(kind: &str, id: &str) -> Self {
        Error::NotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }

    /// Create an error from a non-success HTTP status and its response body.
    ///
    /// The server message (and validation details, when present) is kept verbatim.
    pub fn from_status(status: u16, kind: &str, id: &str, body: &str) -> Self {
        let message = match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) => match parsed.details {
                Some(details) if !details.is_null() => format!("{}: {}", parsed.message, details),
                _ => parsed.message,
            },
            Err(_) => body.trim().to_string(),
        };

        match status {
            404 => Error::not_found(kind, id),
            409 => Error::Conflict { message },
            400 | 422 => Error::Validation { message },
            401 | 403 => Error::Transport {
                message: format!("HTTP {status}: {message}"),
            },
            _ => Error::Api { status, message },
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

/// Result type for Management API operations.
pub type Result<T> = std::result::Result<T, Error>;
