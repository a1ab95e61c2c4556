//! API error types for the JIRA session.

use thiserror::Error;

/// Errors that can occur when talking to the JIRA API.
///
/// Only [`ApiError::AccessDenied`] is absorbed by [`crate::session::JiraSession`];
/// every other variant passes through it untouched.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The remote rejected the request: bad credentials, expired session or
    /// missing permission. Carries the server's message.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The operation has no implementation.
    #[error("Operation not supported: {0}")]
    NotSupported(&'static str),

    /// The request could not be built from the given arguments.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limited by the JIRA API.
    #[error("Rate limited: please wait before retrying")]
    RateLimited,

    /// JIRA server error.
    #[error("JIRA server error: {0}")]
    ServerError(String),

    /// Network or HTTP error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Keyring error when storing/retrieving secrets.
    #[error("Keyring error: {0}")]
    Keyring(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code.
    ///
    /// 401 and 403 are both reported as [`ApiError::AccessDenied`]; the session
    /// layer does not distinguish the sub-causes.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            401 | 403 => ApiError::AccessDenied(context.to_string()),
            404 => ApiError::NotFound(context.to_string()),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(format!("HTTP {}: {}", status, context)),
            _ => ApiError::ServerError(format!("Unexpected HTTP {}: {}", status, context)),
        }
    }

    /// Check whether this is the access-denied failure.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, ApiError::AccessDenied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_error_from_status_401() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "Invalid credentials");
        match err {
            ApiError::AccessDenied(msg) => assert_eq!(msg, "Invalid credentials"),
            _ => panic!("Expected AccessDenied error"),
        }
    }

    #[test]
    fn test_error_from_status_403() {
        let err = ApiError::from_status(StatusCode::FORBIDDEN, "test");
        assert!(err.is_access_denied());
    }

    #[test]
    fn test_error_from_status_404() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "issue PROJ-123");
        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "issue PROJ-123"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_error_from_status_429() {
        let err = ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, "test");
        assert!(matches!(err, ApiError::RateLimited));
    }

    #[test]
    fn test_error_from_status_500() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "test");
        assert!(matches!(err, ApiError::ServerError(_)));
        assert!(!err.is_access_denied());
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::AccessDenied("Invalid credentials".to_string());
        assert_eq!(err.to_string(), "Access denied: Invalid credentials");

        let err = ApiError::NotSupported("add attachment");
        assert_eq!(err.to_string(), "Operation not supported: add attachment");
    }
}
