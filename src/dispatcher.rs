//! Operation dispatch in three invocation modes.
//!
//! Every endpoint funnels through [`Dispatcher::dispatch`]. The same
//! [`RequestDescriptor`] can be executed:
//!
//! - blocking, on the calling thread ([`InvocationMode::Blocking`]),
//! - as an [`OperationFuture`] resolving to an [`Outcome`] ([`InvocationMode::Awaitable`]),
//! - with a continuation invoked once on completion, returning a
//!   [`CancellationHandle`] immediately ([`InvocationMode::Callback`]).
//!
//! The dispatcher never retries, never imposes its own timeout and does not
//! own worker threads. Asynchronous work is handed to a [`Spawner`] supplied
//! by the host.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use url::Url;

use crate::error::{ApiError, TransportError};
use crate::operation::{
    CancellationHandle, InvocationKind, OperationId, OperationStatus, PendingOperation,
};
use crate::parsing::parse_response;
use crate::request::RequestDescriptor;
use crate::transport::{HttpRequest, Transport};

/// Capability to run asynchronous work, provided by the host environment.
pub trait Spawner: Send + Sync {
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

/// Spawns onto a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioSpawner {
    handle: Handle,
}

impl TokioSpawner {
    /// Spawns onto the runtime behind `handle`.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime of the calling context.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Spawner for TokioSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.handle.spawn(task);
    }
}

/// Continuation for callback mode; receives the result or the error.
pub type Continuation<T> = Box<dyn FnOnce(Result<T, ApiError>) + Send + 'static>;

/// How a dispatched operation delivers its result.
pub enum InvocationMode<T> {
    Blocking,
    Awaitable,
    Callback(Continuation<T>),
}

impl<T> InvocationMode<T> {
    /// Wraps a closure as a callback-mode continuation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use serde_json::Value;
    /// use twitter_rest::{ApiError, InvocationMode};
    ///
    /// let mode = InvocationMode::callback(|result: Result<Value, ApiError>| {
    ///     if let Err(e) = result {
    ///         eprintln!("call failed: {}", e);
    ///     }
    /// });
    /// assert!(matches!(mode, InvocationMode::Callback(_)));
    /// ```
    pub fn callback<F>(on_complete: F) -> Self
    where
        F: FnOnce(Result<T, ApiError>) + Send + 'static,
    {
        InvocationMode::Callback(Box::new(on_complete))
    }

    /// The invocation kind recorded on the pending operation.
    pub fn kind(&self) -> InvocationKind {
        match self {
            InvocationMode::Blocking => InvocationKind::Blocking,
            InvocationMode::Awaitable => InvocationKind::Awaitable,
            InvocationMode::Callback(_) => InvocationKind::Callback,
        }
    }
}

impl<T> fmt::Debug for InvocationMode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.kind(), f)
    }
}

/// What [`Dispatcher::dispatch`] hands back for each mode.
#[derive(Debug)]
pub enum Dispatched<T> {
    Blocking(Result<T, ApiError>),
    Awaitable(OperationFuture<T>),
    Callback(CancellationHandle),
}

impl<T> Dispatched<T> {
    /// The result of a blocking dispatch; `None` for the other modes.
    pub fn into_result(self) -> Option<Result<T, ApiError>> {
        match self {
            Dispatched::Blocking(result) => Some(result),
            _ => None,
        }
    }

    /// The future of an awaitable dispatch; `None` for the other modes.
    pub fn into_future(self) -> Option<OperationFuture<T>> {
        match self {
            Dispatched::Awaitable(future) => Some(future),
            _ => None,
        }
    }

    /// Blocking calls are not cancellable and have no handle.
    pub fn cancellation_handle(&self) -> Option<CancellationHandle> {
        match self {
            Dispatched::Blocking(_) => None,
            Dispatched::Awaitable(future) => Some(future.cancellation_handle()),
            Dispatched::Callback(handle) => Some(handle.clone()),
        }
    }
}

/// Terminal outcome of an awaitable operation.
///
/// `Cancelled` is not a failure: the caller withdrew interest.
#[derive(Debug)]
pub enum Outcome<T> {
    Completed(T),
    Failed(ApiError),
    Cancelled,
}

impl<T> Outcome<T> {
    /// `None` for a cancelled operation.
    pub fn into_result(self) -> Option<Result<T, ApiError>> {
        match self {
            Outcome::Completed(value) => Some(Ok(value)),
            Outcome::Failed(err) => Some(Err(err)),
            Outcome::Cancelled => None,
        }
    }

    /// Whether the operation ended by cancellation rather than a result.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }
}

/// Future returned by the awaitable mode.
///
/// Resolves exactly once. Dropping it before resolution cancels the
/// operation.
pub struct OperationFuture<T> {
    operation: Arc<PendingOperation>,
    receiver: oneshot::Receiver<Result<T, ApiError>>,
}

impl<T> OperationFuture<T> {
    /// Identifier of the underlying operation, as it appears in logs.
    pub fn id(&self) -> OperationId {
        self.operation.id()
    }

    /// A handle that can cancel this operation from elsewhere.
    pub fn cancellation_handle(&self) -> CancellationHandle {
        self.operation.handle()
    }

    /// Cancels the operation; see [`CancellationHandle::cancel`].
    ///
    /// # Returns
    ///
    /// `true` if this call moved the operation to `Cancelled`.
    pub fn cancel(&self) -> bool {
        self.operation.cancel()
    }
}

impl<T> fmt::Debug for OperationFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationFuture")
            .field("operation", &self.operation)
            .finish()
    }
}

impl<T> Future for OperationFuture<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(Ok(value))) => Poll::Ready(Outcome::Completed(value)),
            Poll::Ready(Ok(Err(err))) => Poll::Ready(Outcome::Failed(err)),
            // The sender is only dropped without sending when cancellation
            // won, or when the host discarded the task.
            Poll::Ready(Err(_)) => match this.operation.status() {
                OperationStatus::Cancelled => Poll::Ready(Outcome::Cancelled),
                _ => Poll::Ready(Outcome::Failed(ApiError::Transport(
                    TransportError::Aborted(format!(
                        "operation {} was dropped before completion",
                        this.operation.id()
                    )),
                ))),
            },
        }
    }
}

impl<T> Drop for OperationFuture<T> {
    fn drop(&mut self) {
        self.operation.cancel();
    }
}

enum Delivery<T> {
    Channel(oneshot::Sender<Result<T, ApiError>>),
    Callback(Continuation<T>),
}

impl<T> Delivery<T> {
    fn deliver(self, result: Result<T, ApiError>) {
        match self {
            Delivery::Channel(sender) => {
                // The receiver may be gone; the outcome is still final.
                let _ = sender.send(result);
            }
            Delivery::Callback(on_complete) => on_complete(result),
        }
    }
}

struct Inner {
    transport: Arc<dyn Transport>,
    spawner: Arc<dyn Spawner>,
    base_url: Url,
    next_id: AtomicU64,
}

/// Executes [`RequestDescriptor`]s against a [`Transport`].
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_url", &self.inner.base_url.as_str())
            .finish()
    }
}

impl Dispatcher {
    /// Creates a dispatcher.
    ///
    /// # Parameters
    ///
    /// - `transport`: Sends serialized requests (usually a [`ReqwestTransport`](crate::ReqwestTransport))
    /// - `spawner`: Runs awaitable and callback operations
    /// - `base_url`: API root that descriptor paths resolve against
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use twitter_rest::{ClientConfig, Dispatcher, ReqwestTransport, TokioSpawner};
    ///
    /// let runtime = tokio::runtime::Runtime::new().unwrap();
    /// let config = ClientConfig::new("your_access_token");
    /// let transport = ReqwestTransport::new(&config, runtime.handle().clone()).unwrap();
    /// let dispatcher = Dispatcher::new(
    ///     Arc::new(transport),
    ///     Arc::new(TokioSpawner::new(runtime.handle().clone())),
    ///     config.base_url.clone(),
    /// );
    /// assert_eq!(dispatcher.base_url().as_str(), "https://api.twitter.com/1.1");
    /// ```
    pub fn new(transport: Arc<dyn Transport>, spawner: Arc<dyn Spawner>, base_url: Url) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                spawner,
                base_url,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// API root that descriptor paths are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Single entry point: executes `descriptor` in the given mode.
    pub fn dispatch<T>(&self, descriptor: RequestDescriptor, mode: InvocationMode<T>) -> Dispatched<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        match mode {
            InvocationMode::Blocking => Dispatched::Blocking(self.invoke_blocking(descriptor)),
            InvocationMode::Awaitable => Dispatched::Awaitable(self.invoke_awaitable(descriptor)),
            InvocationMode::Callback(on_complete) => {
                Dispatched::Callback(self.schedule_callback(descriptor, on_complete))
            }
        }
    }

    /// Runs the call to completion on the calling thread.
    ///
    /// Must not be called from inside an async task: it blocks the thread
    /// until the transport answers.
    pub fn invoke_blocking<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<T, ApiError> {
        let operation = self.register(descriptor, InvocationKind::Blocking);
        let result = futures::executor::block_on(self.execute::<T>(&operation));
        operation.finish(terminal_status(&result));
        log_outcome(&operation, &result);
        result
    }

    /// Schedules the call and returns a future for its outcome.
    pub fn invoke_awaitable<T>(&self, descriptor: RequestDescriptor) -> OperationFuture<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let operation = self.register(descriptor, InvocationKind::Awaitable);
        let (sender, receiver) = oneshot::channel();
        self.schedule(operation.clone(), Delivery::Channel(sender));
        OperationFuture {
            operation,
            receiver,
        }
    }

    /// Schedules the call; `on_complete` runs exactly once unless the
    /// returned handle cancels the operation first.
    pub fn invoke_with_callback<T, F>(
        &self,
        descriptor: RequestDescriptor,
        on_complete: F,
    ) -> CancellationHandle
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<T, ApiError>) + Send + 'static,
    {
        self.schedule_callback(descriptor, Box::new(on_complete))
    }

    fn schedule_callback<T>(
        &self,
        descriptor: RequestDescriptor,
        on_complete: Continuation<T>,
    ) -> CancellationHandle
    where
        T: DeserializeOwned + Send + 'static,
    {
        let operation = self.register(descriptor, InvocationKind::Callback);
        let handle = operation.handle();
        self.schedule(operation, Delivery::Callback(on_complete));
        handle
    }

    fn register(&self, descriptor: RequestDescriptor, kind: InvocationKind) -> Arc<PendingOperation> {
        let id = OperationId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        info!(
            "Dispatching {} {} {} ({:?})",
            id,
            descriptor.method(),
            descriptor.path_template(),
            kind
        );
        Arc::new(PendingOperation::new(id, kind, descriptor))
    }

    fn schedule<T>(&self, operation: Arc<PendingOperation>, delivery: Delivery<T>)
    where
        T: DeserializeOwned + Send + 'static,
    {
        let dispatcher = self.clone();
        self.inner
            .spawner
            .spawn(Box::pin(async move { dispatcher.run(operation, delivery).await }));
    }

    async fn run<T>(self, operation: Arc<PendingOperation>, delivery: Delivery<T>)
    where
        T: DeserializeOwned + Send + 'static,
    {
        if operation.status().is_terminal() {
            debug!("Operation {} cancelled before it started", operation.id());
            return;
        }

        let result = tokio::select! {
            biased;
            _ = operation.aborted() => {
                debug!("Operation {} aborted while in flight", operation.id());
                return;
            }
            result = self.execute::<T>(&operation) => result,
        };

        if operation.finish(terminal_status(&result)) {
            log_outcome(&operation, &result);
            delivery.deliver(result);
        } else {
            debug!(
                "Discarding late completion of cancelled operation {}",
                operation.id()
            );
        }
    }

    async fn execute<T: DeserializeOwned>(&self, operation: &PendingOperation) -> Result<T, ApiError> {
        let descriptor = operation.descriptor();
        let request = HttpRequest::from_descriptor(descriptor, &self.inner.base_url)?;
        debug!("{} sending {} {}", operation.id(), request.method, request.url);

        let raw = self.inner.transport.send(request).await?;
        debug!(
            "{} received status {} ({} bytes)",
            operation.id(),
            raw.status,
            raw.body.len()
        );

        parse_response(&raw, descriptor.shape())
    }
}

fn terminal_status<T>(result: &Result<T, ApiError>) -> OperationStatus {
    if result.is_ok() {
        OperationStatus::Completed
    } else {
        OperationStatus::Failed
    }
}

fn log_outcome<T>(operation: &PendingOperation, result: &Result<T, ApiError>) {
    match result {
        Ok(_) => info!("Operation {} completed successfully", operation.id()),
        Err(err) => warn!("Operation {} failed: {}", operation.id(), err),
    }
}
