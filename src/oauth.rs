//! Credential attachment for outgoing requests.
//!
//! The transport calls a [`CredentialAttacher`] on every request just before
//! it goes on the wire. The dispatcher never touches credentials.

use std::fmt;

use crate::transport::HttpRequest;

/// Decorates an outgoing request with authentication material.
pub trait CredentialAttacher: Send + Sync + fmt::Debug {
    fn attach(&self, request: &mut HttpRequest);
}

/// Builds the Authorization header for OAuth 2.0 User Context authentication.
///
/// # Format
///
/// ```text
/// Bearer YOUR_ACCESS_TOKEN_HERE
/// ```
///
/// # Example
///
/// ```rust
/// use twitter_rest::build_oauth2_user_context_header;
///
/// let header = build_oauth2_user_context_header("your_access_token");
/// assert_eq!(header, "Bearer your_access_token");
/// ```
pub fn build_oauth2_user_context_header(access_token: &str) -> String {
    format!("Bearer {}", access_token)
}

/// OAuth 2.0 bearer credentials (app-only or user context).
#[derive(Clone)]
pub struct BearerCredentials {
    access_token: String,
}

impl BearerCredentials {
    /// Wraps an OAuth 2.0 access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for BearerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerCredentials")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl CredentialAttacher for BearerCredentials {
    fn attach(&self, request: &mut HttpRequest) {
        request.set_header(
            "Authorization",
            build_oauth2_user_context_header(&self.access_token),
        );
    }
}

/// Sends requests unauthenticated. Useful against mock servers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialAttacher for NoCredentials {
    fn attach(&self, _request: &mut HttpRequest) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;

    #[test]
    fn bearer_replaces_existing_authorization() {
        let mut request = HttpRequest::new(
            Method::Get,
            url::Url::parse("https://api.twitter.com/1.1/account/settings.json").unwrap(),
        );
        request.set_header("authorization", "Bearer stale");

        BearerCredentials::new("fresh").attach(&mut request);

        assert_eq!(request.header("Authorization"), Some("Bearer fresh"));
        assert_eq!(request.headers.len(), 1);
        assert!(!format!("{:?}", BearerCredentials::new("secret")).contains("secret"));
    }
}
