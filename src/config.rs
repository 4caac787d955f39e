//! Configuration for the REST client.
//!
//! Credentials and endpoint settings come from environment variables, the
//! same way the service binaries are deployed.

use std::env;
use std::time::Duration;

use log::{debug, error, info, warn};
use thiserror::Error;
use url::Url;

/// Default REST API root.
pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com/1.1";

/// Default transport timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while loading [`ClientConfig`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing {0} environment variable")]
    Missing(&'static str),

    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Settings for talking to the Twitter/X REST API.
#[derive(Clone)]
pub struct ClientConfig {
    /// OAuth 2.0 access token attached to every request.
    pub access_token: String,
    /// API root that endpoint paths are resolved against.
    pub base_url: Url,
    /// Transport timeout; expiry surfaces as a timeout transport error.
    pub timeout: Duration,
    pub user_agent: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("access_token", &mask_token(&self.access_token))
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Creates a config with default endpoint settings.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: default_base_url(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
        }
    }

    /// Overrides the API root, e.g. to point at a mock server.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Overrides the transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `xapi_access_token`: OAuth 2.0 access token
    ///
    /// # Optional Environment Variables
    ///
    /// - `XAPI_BASE_URL`: API root (defaults to `https://api.twitter.com/1.1`)
    /// - `XAPI_TIMEOUT_SECS`: transport timeout in seconds (defaults to 30)
    /// - `XAPI_USER_AGENT`: User-Agent header (defaults to `twitter-rest/<version>`)
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use twitter_rest::ClientConfig;
    ///
    /// std::env::set_var("xapi_access_token", "your_access_token");
    /// let config = ClientConfig::from_env().unwrap();
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading client configuration from environment variables");
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token = match lookup("xapi_access_token") {
            Some(token) => {
                info!(
                    "Found xapi_access_token environment variable with length: {}",
                    token.len()
                );
                debug!("Access token (masked): {}", mask_token(&token));

                if token.trim().is_empty() {
                    error!("Access token is empty");
                    return Err(ConfigError::Empty("xapi_access_token"));
                }
                if token.len() < 10 {
                    warn!(
                        "Access token seems unusually short ({} characters)",
                        token.len()
                    );
                }
                token
            }
            None => {
                error!("Make sure xapi_access_token environment variable is set");
                return Err(ConfigError::Missing("xapi_access_token"));
            }
        };

        let base_url = match lookup("XAPI_BASE_URL") {
            Some(raw) => {
                info!("Using API base URL from XAPI_BASE_URL: {}", raw);
                Url::parse(&raw).map_err(|_| ConfigError::Invalid {
                    name: "XAPI_BASE_URL",
                    value: raw.clone(),
                })?
            }
            None => default_base_url(),
        };

        let timeout = match lookup("XAPI_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "XAPI_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let user_agent = lookup("XAPI_USER_AGENT").unwrap_or_else(default_user_agent);

        let config = ClientConfig {
            access_token,
            base_url,
            timeout,
            user_agent,
        };
        info!(
            "Client configuration loaded: base URL {}, timeout {:?}",
            config.base_url, config.timeout
        );

        Ok(config)
    }
}

/// Masks a secret for logging, keeping at most the first and last 8 characters.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let len = chars.len();
    let prefix: String = chars.iter().take(8).collect();

    if len > 16 {
        let suffix: String = chars[len - 8..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        format!("{}...", prefix)
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL")
}

fn default_user_agent() -> String {
    format!("twitter-rest/{}", env!("CARGO_PKG_VERSION"))
}
