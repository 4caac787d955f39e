//! HTTP transport boundary.
//!
//! The dispatcher treats the transport as an opaque capability: it hands over
//! an [`HttpRequest`] and gets back a [`RawResponse`] or a [`TransportError`].
//! [`ReqwestTransport`] is the production implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::oauth::{BearerCredentials, CredentialAttacher};
use crate::request::{Method, RequestDescriptor};
use crate::ApiError;

/// A fully serialized request, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// An empty request with no headers and no body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Serializes a descriptor against `base_url`.
    pub fn from_descriptor(descriptor: &RequestDescriptor, base_url: &Url) -> Result<Self, ApiError> {
        let mut request = HttpRequest::new(descriptor.method(), descriptor.url(base_url)?);
        if let Some((content_type, body)) = descriptor.body()? {
            request.set_header("Content-Type", content_type);
            request.body = Some(body);
        }
        Ok(request)
    }

    /// Sets a header, replacing any existing value (names compare case-insensitively).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status, headers and body bytes exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Adds a header; handy for building canned responses.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and returns the raw response.
///
/// Dropping the returned future must be safe at any point; implementations
/// that can abort an in-flight request should do so on drop.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport.
///
/// Requests run as tasks on the supplied tokio runtime, so the future
/// returned by [`send`](Transport::send) can be driven by any executor,
/// including the blocking invocation mode. Dropping that future aborts the
/// task.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    credentials: Arc<dyn CredentialAttacher>,
    runtime: Handle,
}

impl ReqwestTransport {
    /// Creates the transport from a client configuration.
    ///
    /// # Parameters
    ///
    /// - `config`: Supplies the bearer token, timeout and User-Agent
    /// - `runtime`: Runtime the HTTP requests are spawned on
    ///
    /// # Returns
    ///
    /// - `Ok(ReqwestTransport)`: If the HTTP client could be built
    /// - `Err(TransportError)`: If reqwest rejected the client settings
    pub fn new(
        config: &ClientConfig,
        runtime: Handle,
    ) -> Result<Self, TransportError> {
        let credentials = Arc::new(BearerCredentials::new(config.access_token.clone()));
        Self::with_credentials(config.timeout, &config.user_agent, credentials, runtime)
    }

    /// Like [`new`](Self::new), with a custom [`CredentialAttacher`].
    pub fn with_credentials(
        timeout: Duration,
        user_agent: &str,
        credentials: Arc<dyn CredentialAttacher>,
        runtime: Handle,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            credentials,
            runtime,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, mut request: HttpRequest) -> Result<RawResponse, TransportError> {
        self.credentials.attach(&mut request);

        let client = self.client.clone();
        let task = AbortOnDrop(self.runtime.spawn(async move {
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Post => reqwest::Method::POST,
                Method::Delete => reqwest::Method::DELETE,
            };
            let mut builder = client.request(method, request.url.clone());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.bytes().await?.to_vec();
            debug!("Received {} bytes with status {}", body.len(), status);

            Ok::<_, TransportError>(RawResponse {
                status,
                headers,
                body,
            })
        }));

        task.join().await
    }
}

/// Aborts the wrapped task when dropped before completion.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> AbortOnDrop<Result<T, TransportError>> {
    async fn join(mut self) -> Result<T, TransportError> {
        match (&mut self.0).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(TransportError::Aborted(e.to_string())),
            Err(e) => {
                warn!("Transport task failed: {}", e);
                Err(TransportError::Protocol(format!("transport task failed: {}", e)))
            }
        }
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}
