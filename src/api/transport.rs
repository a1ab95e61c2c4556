//! Transport seam and the HTTP implementation of it.
//!
//! A [`Transport`] performs one authenticated call per [`ApiRequest`] and
//! hands back the decoded JSON body. Rejections for authentication or
//! permission reasons come back as [`ApiError::AccessDenied`]; everything
//! else keeps its own variant.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::auth::Auth;
use super::error::{ApiError, Result};
use super::request::ApiRequest;
use crate::config::{AuthMode, Profile, Settings};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Performs requests against the remote API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the JSON body of a successful response.
    ///
    /// An empty success body is returned as `Value::Null`.
    async fn send(&self, request: ApiRequest) -> Result<serde_json::Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<serde_json::Value> {
        (**self).send(request).await
    }
}

/// Send a request and decode the response into `T`.
///
/// Decode failures are reported as [`ApiError::InvalidResponse`].
pub async fn execute<T, R>(transport: &R, request: ApiRequest) -> Result<T>
where
    T: DeserializeOwned,
    R: Transport + ?Sized,
{
    let value = transport.send(request).await?;
    serde_json::from_value(value)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
}

/// [`Transport`] over HTTP using reqwest.
///
/// Keeps a cookie store so the session cookie obtained by authenticating is
/// replayed on later calls. Optionally sends a Basic auth header as well.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// The HTTP client.
    client: Client,
    /// The base URL for the JIRA instance, without trailing slash.
    base_url: String,
    /// Credentials sent with every request, if any.
    auth: Option<Auth>,
}

impl HttpTransport {
    /// Create a transport for the given JIRA instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a transport with an explicit request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url);
        Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            client: Self::build_http_client(timeout)?,
            base_url,
            auth: None,
        })
    }

    /// Create a transport for a configured profile.
    ///
    /// Profiles using Basic auth get their header built from `secret`.
    #[instrument(skip(profile, settings, secret), fields(profile_name = %profile.name))]
    pub fn from_profile(profile: &Profile, settings: &Settings, secret: &str) -> Result<Self> {
        info!("Creating HTTP transport for profile");

        let transport = Self::with_timeout(
            &profile.url,
            Duration::from_secs(settings.timeout_secs),
        )?;

        debug!(base_url = %transport.base_url(), auth = ?profile.auth, "Transport ready");
        Ok(match profile.auth {
            AuthMode::Basic => transport.with_auth(Auth::basic(&profile.username, secret)),
            AuthMode::Session => transport,
        })
    }

    /// Send Basic auth credentials with every request.
    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Build the HTTP client with appropriate settings.
    fn build_http_client(timeout: Duration) -> Result<Client> {
        Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(ApiError::Network)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Handle the HTTP response, checking for errors and parsing JSON.
    async fn handle_response(response: Response) -> Result<serde_json::Value> {
        let status = response.status();
        let url = response.url().to_string();

        if status.is_success() {
            let body = response.text().await?;
            if body.trim().is_empty() {
                return Ok(serde_json::Value::Null);
            }
            serde_json::from_str(&body)
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
        } else {
            let error_body = response.text().await.unwrap_or_default();
            debug!("Error response body: {}", error_body);

            Err(Self::error_from_response(status, &url, &error_body))
        }
    }

    /// Create an appropriate error from an HTTP response.
    ///
    /// JIRA reports failures as `{"errorMessages": [...], "errors": {...}}`;
    /// those messages are preferred over the bare URL as error context.
    fn error_from_response(status: StatusCode, url: &str, body: &str) -> ApiError {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(messages) = json.get("errorMessages").and_then(|m| m.as_array()) {
                let messages: Vec<&str> = messages.iter().filter_map(|v| v.as_str()).collect();
                if !messages.is_empty() {
                    return ApiError::from_status(status, &messages.join(", "));
                }
            }
            if let Some(errors) = json.get("errors").and_then(|e| e.as_object()) {
                let error_strings: Vec<String> = errors
                    .iter()
                    .map(|(k, v)| match v.as_str() {
                        Some(s) => format!("{}: {}", k, s),
                        None => format!("{}: {}", k, v),
                    })
                    .collect();
                if !error_strings.is_empty() {
                    return ApiError::from_status(status, &error_strings.join(", "));
                }
            }
        }

        let context = match status.canonical_reason() {
            Some(reason) => format!("{} ({})", reason, url),
            None => url.to_string(),
        };
        ApiError::from_status(status, &context)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: ApiRequest) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!("Sending request");

        let mut builder = self
            .client
            .request(request.method, &url)
            .header(header::ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(auth) = &self.auth {
            builder = builder.header(header::AUTHORIZATION, auth.header_value());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let result = Self::handle_response(response).await;

        if let Err(e) = &result {
            if e.is_access_denied() {
                warn!("Request denied: {}", e);
            }
        }
        result
    }
}

/// Normalize the base URL by removing trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    // Warn if not HTTPS (but don't enforce for localhost/testing)
    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1") {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url_removes_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://jira.example.com/"),
            "https://jira.example.com"
        );
    }

    #[test]
    fn test_normalize_base_url_handles_multiple_slashes() {
        assert_eq!(
            normalize_base_url("https://jira.example.com///"),
            "https://jira.example.com"
        );
    }

    #[test]
    fn test_normalize_base_url_preserves_path() {
        assert_eq!(
            normalize_base_url("https://example.com/jira/"),
            "https://example.com/jira"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = HttpTransport::new("not a url");
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_error_from_response_uses_error_messages() {
        let err = HttpTransport::error_from_response(
            StatusCode::UNAUTHORIZED,
            "https://jira.example.com/rest/auth/1/session",
            r#"{"errorMessages":["Login failed"],"errors":{}}"#,
        );
        match err {
            ApiError::AccessDenied(msg) => assert_eq!(msg, "Login failed"),
            other => panic!("Expected AccessDenied, got {:?}", other),
        }
    }

    #[test]
    fn test_error_from_response_uses_field_errors() {
        let err = HttpTransport::error_from_response(
            StatusCode::BAD_REQUEST,
            "https://jira.example.com/rest/api/2/issue",
            r#"{"errorMessages":[],"errors":{"summary":"Summary is required"}}"#,
        );
        match err {
            ApiError::ServerError(msg) => assert!(msg.contains("summary: Summary is required")),
            other => panic!("Expected ServerError, got {:?}", other),
        }
    }

    #[test]
    fn test_error_from_response_without_body() {
        let err = HttpTransport::error_from_response(
            StatusCode::FORBIDDEN,
            "https://jira.example.com/rest/api/2/myself",
            "",
        );
        match err {
            ApiError::AccessDenied(msg) => {
                assert!(msg.contains("Forbidden"));
                assert!(msg.contains("/rest/api/2/myself"));
            }
            other => panic!("Expected AccessDenied, got {:?}", other),
        }
    }
}
