//! # twitter-rest
//!
//! A client library for the Twitter/X REST API (v1.1 endpoints: timelines,
//! friendships, lists, search, geo, direct messages).
//!
//! ## Features
//!
//! - One [`Dispatcher`] for every endpoint, with three invocation modes:
//!   blocking, awaitable ([`OperationFuture`]) and callback with a
//!   [`CancellationHandle`]
//! - Exactly-once delivery: completion and cancellation race through a
//!   single atomic transition
//! - Cursor traversal over followers, friends and list memberships as a lazy
//!   iterator or stream ([`CursorTraversal`])
//! - Uniform error taxonomy ([`ApiError`]) across all modes, no hidden retries
//! - Structured logging through the `log` facade
//!
//! ## Configuration
//!
//! - `xapi_access_token`: OAuth 2.0 access token (required)
//! - `XAPI_BASE_URL`: API root (defaults to `https://api.twitter.com/1.1`)
//! - `XAPI_TIMEOUT_SECS`: transport timeout (defaults to 30)

pub mod config;
pub mod cursor;
pub mod dispatcher;
pub mod error;
pub mod oauth;
pub mod operation;
mod parsing;
pub mod request;
pub mod transport;
pub mod traversal;
pub mod twitter;

// Re-export commonly used types and functions
pub use config::{mask_token, ClientConfig, ConfigError};
pub use cursor::{Cursor, CursoredPage, Direction};
pub use dispatcher::{
    Continuation, Dispatched, Dispatcher, InvocationMode, OperationFuture, Outcome, Spawner,
    TokioSpawner,
};
pub use error::{ApiError, RateLimit, RemoteErrorDetail, TransportError};
pub use oauth::{build_oauth2_user_context_header, BearerCredentials, CredentialAttacher, NoCredentials};
pub use operation::{CancellationHandle, InvocationKind, OperationId, OperationStatus};
pub use request::{Method, RequestDescriptor, ResponseShape};
pub use transport::{HttpRequest, RawResponse, ReqwestTransport, Transport};
pub use traversal::CursorTraversal;
pub use twitter::{TwitterClient, UserRef};
