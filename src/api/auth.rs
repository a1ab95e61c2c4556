//! Credential handling for the JIRA API.
//!
//! Secrets (passwords or API tokens) are kept in the OS keyring, keyed by
//! profile name. An [`Auth`] value turns a username and secret into a
//! ready-to-send Basic auth header.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::error::{ApiError, Result};

/// The keyring service name for jira-session secrets.
const KEYRING_SERVICE: &str = "jira-session";

/// Basic authentication credentials.
#[derive(Clone)]
pub struct Auth {
    /// The username the header was built for.
    username: String,
    /// The complete "Basic ..." header value.
    auth_header: String,
}

impl Auth {
    /// Create Basic auth credentials from a username and secret.
    ///
    /// The secret is encoded immediately and not stored in plain form.
    pub fn basic(username: &str, secret: &str) -> Self {
        Self {
            username: username.to_string(),
            auth_header: build_auth_header(username, secret),
        }
    }

    /// Get the authorization header value for HTTP requests.
    pub fn header_value(&self) -> &str {
        &self.auth_header
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("username", &self.username)
            .field("auth_header", &"<redacted>")
            .finish()
    }
}

/// Build the Basic Auth header value.
fn build_auth_header(username: &str, secret: &str) -> String {
    let credentials = format!("{}:{}", username, secret);
    format!("Basic {}", BASE64.encode(credentials.as_bytes()))
}

fn entry(profile_name: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))
}

/// Store a secret in the OS keyring for a profile.
///
/// # Errors
///
/// Returns an error if the secret cannot be stored in the keyring.
pub fn store_secret(profile_name: &str, secret: &str) -> Result<()> {
    entry(profile_name)?
        .set_password(secret)
        .map_err(|e| ApiError::Keyring(format!("failed to store secret: {}", e)))
}

/// Retrieve a profile's secret from the OS keyring.
///
/// # Errors
///
/// Returns an error if no secret is stored or the keyring is unavailable.
pub fn get_secret(profile_name: &str) -> Result<String> {
    entry(profile_name)?
        .get_password()
        .map_err(|e| ApiError::Keyring(format!("failed to retrieve secret: {}", e)))
}
