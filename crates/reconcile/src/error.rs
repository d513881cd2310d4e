//! Error types for reconciliation.

use cmakit::ErrorCategory;
use thiserror::Error;

/// Errors raised while reconciling a resource.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The Management API refused or failed a call
    #[error(transparent)]
    Api(#[from] cmakit::Error),

    /// The declaration cannot be sent as-is
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Category of the underlying failure. Configuration errors count as validation failures.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Api(err) => err.category(),
            Error::InvalidConfig(_) => ErrorCategory::Validation,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api(err) if err.is_not_found())
    }
}

/// Result type for reconciliation internals.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_keep_their_category() {
        let err: Error = cmakit::Error::not_found("Entry", "e1").into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Entry not found: e1");

        let err: Error = cmakit::Error::Conflict { message: "stale".into() }.into();
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_invalid_config_is_validation() {
        let err = Error::InvalidConfig("topics must not be empty".into());
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.to_string(), "invalid configuration: topics must not be empty");
    }
}
