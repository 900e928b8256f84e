//! Error types for talking to the Google Ads API.

use std::path::PathBuf;

use thiserror::Error;

use crate::service::ServiceFailure;

/// Errors raised by the keyword idea service, its credentials, and OAuth.
#[derive(Debug, Error)]
pub enum AdsError {
    /// The API answered with a structured failure (quota, invalid argument,
    /// internal error, ...).
    #[error("request failed with status {}", .0.status)]
    Service(ServiceFailure),

    /// A non-success HTTP response without a decodable error body.
    #[error("HTTP {status} from {endpoint}: {message}")]
    Http {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// A transport-level error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// A successful response whose body could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The OAuth token endpoint rejected our credentials.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// The credentials file is missing or malformed.
    #[error("credentials error in {}: {message}", path.display())]
    Credentials { path: PathBuf, message: String },

    /// Local I/O failure (loopback listener, socket reads).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error propagated from the core domain layer.
    #[error(transparent)]
    Core(#[from] kwresearch_core::Error),
}

impl AdsError {
    /// Returns `true` when the API itself reported the failure, as opposed
    /// to a transport, decoding, or authentication problem.
    pub fn is_service_reported(&self) -> bool {
        matches!(self, Self::Service(_))
    }

    /// Returns `true` when the API reported quota or rate exhaustion.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Service(failure) => failure.is_resource_exhausted(),
            _ => false,
        }
    }

    /// Returns `true` when the operation may succeed if retried later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Service(failure) => {
                failure.is_resource_exhausted()
                    || matches!(failure.status.as_str(), "UNAVAILABLE" | "INTERNAL" | "DEADLINE_EXCEEDED")
            }
            _ => false,
        }
    }
}

/// Convenience alias for results from this crate.
pub type AdsResult<T> = std::result::Result<T, AdsError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(status: &str, http_status: u16) -> ServiceFailure {
        ServiceFailure {
            status: status.to_string(),
            http_status,
            message: String::new(),
            errors: Vec::new(),
            request_id: None,
        }
    }

    #[test]
    fn test_resource_exhausted_is_rate_limited() {
        let err = AdsError::Service(failure("RESOURCE_EXHAUSTED", 429));
        assert!(err.is_service_reported());
        assert!(err.is_rate_limited());
        assert!(err.is_transient());
    }

    #[test]
    fn test_invalid_argument_is_not_rate_limited() {
        let err = AdsError::Service(failure("INVALID_ARGUMENT", 400));
        assert!(err.is_service_reported());
        assert!(!err.is_rate_limited());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_non_service_errors() {
        let err = AdsError::Parse {
            message: "bad json".to_string(),
        };
        assert!(!err.is_service_reported());
        assert!(!err.is_rate_limited());

        let err = AdsError::Http {
            endpoint: "token".to_string(),
            status: 503,
            message: String::new(),
        };
        assert!(err.is_transient());
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_display() {
        let err = AdsError::Service(failure("RESOURCE_EXHAUSTED", 429));
        assert_eq!(err.to_string(), "request failed with status RESOURCE_EXHAUSTED");
    }
}
