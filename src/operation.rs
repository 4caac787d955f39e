//! In-flight operation state and cancellation handles.
//!
//! A [`PendingOperation`] moves from `Active` to exactly one terminal state.
//! Transport completion and cancellation race for that transition through a
//! single compare-and-swap, so whichever arrives first wins and the other is
//! discarded.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use log::debug;
use tokio::sync::Notify;

use crate::request::RequestDescriptor;

/// Identifier assigned by the dispatcher, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

impl OperationId {
    pub(crate) fn new(raw: u64) -> Self {
        OperationId(raw)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Lifecycle state of a dispatched operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Active,
    Completed,
    Failed,
    Cancelled,
}

impl OperationStatus {
    /// `true` for every state except `Active`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationStatus::Active)
    }

    fn to_u8(self) -> u8 {
        match self {
            OperationStatus::Active => 0,
            OperationStatus::Completed => 1,
            OperationStatus::Failed => 2,
            OperationStatus::Cancelled => 3,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => OperationStatus::Active,
            1 => OperationStatus::Completed,
            2 => OperationStatus::Failed,
            _ => OperationStatus::Cancelled,
        }
    }
}

/// How the result of an operation reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    Blocking,
    Awaitable,
    Callback,
}

/// Dispatcher-owned state of one in-flight call.
pub struct PendingOperation {
    id: OperationId,
    kind: InvocationKind,
    descriptor: RequestDescriptor,
    state: AtomicU8,
    abort: Notify,
}

impl fmt::Debug for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingOperation")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("path", &self.descriptor.path_template())
            .field("status", &self.status())
            .finish()
    }
}

impl PendingOperation {
    pub(crate) fn new(id: OperationId, kind: InvocationKind, descriptor: RequestDescriptor) -> Self {
        Self {
            id,
            kind,
            descriptor,
            state: AtomicU8::new(OperationStatus::Active.to_u8()),
            abort: Notify::new(),
        }
    }

    /// Identifier assigned by the dispatcher.
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// How the result of this operation is delivered.
    pub fn kind(&self) -> InvocationKind {
        self.kind
    }

    /// The request this operation executes.
    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Current state of the operation.
    pub fn status(&self) -> OperationStatus {
        OperationStatus::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Moves `Active` to `terminal`. Returns `false` if another transition
    /// already happened.
    pub(crate) fn finish(&self, terminal: OperationStatus) -> bool {
        debug_assert!(terminal.is_terminal());
        self.state
            .compare_exchange(
                OperationStatus::Active.to_u8(),
                terminal.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Requests cancellation. Returns `true` only for the call that actually
    /// moved the operation to `Cancelled`.
    pub(crate) fn cancel(&self) -> bool {
        if self.finish(OperationStatus::Cancelled) {
            debug!("Operation {} cancelled", self.id);
            // A stored permit wakes the task even if it is not waiting yet.
            self.abort.notify_one();
            true
        } else {
            false
        }
    }

    /// Resolves once cancellation has been requested.
    pub(crate) async fn aborted(&self) {
        self.abort.notified().await
    }

    pub(crate) fn handle(self: &Arc<Self>) -> CancellationHandle {
        CancellationHandle {
            id: self.id,
            operation: Arc::downgrade(self),
        }
    }
}

/// Capability to withdraw interest in a pending operation.
///
/// The handle owns nothing: it holds a weak reference into dispatcher-owned
/// state, so it may outlive the operation. Cancelling is idempotent and
/// never fails.
#[derive(Clone)]
pub struct CancellationHandle {
    id: OperationId,
    operation: Weak<PendingOperation>,
}

impl fmt::Debug for CancellationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationHandle")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}

impl CancellationHandle {
    /// Identifier of the operation this handle refers to.
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Requests that the completion never be delivered and aborts the
    /// transport call if it is still pending.
    ///
    /// Returns `true` if this call cancelled the operation, `false` if it had
    /// already reached a terminal state. Either way, no completion will be
    /// delivered twice.
    pub fn cancel(&self) -> bool {
        match self.operation.upgrade() {
            Some(operation) => operation.cancel(),
            None => false,
        }
    }

    /// Current state, or `None` once the dispatcher has released the
    /// operation (which only happens after a terminal transition).
    pub fn status(&self) -> Option<OperationStatus> {
        self.operation.upgrade().map(|op| op.status())
    }

    /// Whether the operation reached a terminal state or was already released.
    pub fn is_finished(&self) -> bool {
        self.status().map_or(true, |status| status.is_terminal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operation() -> Arc<PendingOperation> {
        Arc::new(PendingOperation::new(
            OperationId::new(7),
            InvocationKind::Callback,
            RequestDescriptor::get("account/settings.json").build(),
        ))
    }

    #[test]
    fn only_first_terminal_transition_wins() {
        let op = operation();
        assert!(op.finish(OperationStatus::Completed));
        assert!(!op.finish(OperationStatus::Failed));
        assert!(!op.cancel());
        assert_eq!(op.status(), OperationStatus::Completed);
    }

    #[test]
    fn cancel_is_idempotent() {
        let op = operation();
        let handle = op.handle();
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(!op.finish(OperationStatus::Completed));
        assert_eq!(handle.status(), Some(OperationStatus::Cancelled));
    }

    #[test]
    fn handle_outlives_operation() {
        let op = operation();
        let handle = op.handle();
        drop(op);
        assert!(!handle.cancel());
        assert!(handle.is_finished());
        assert_eq!(handle.status(), None);
        assert_eq!(handle.id().to_string(), "op-7");
    }

    #[tokio::test]
    async fn cancel_before_waiting_still_wakes() {
        let op = operation();
        op.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), op.aborted())
            .await
            .expect("stored permit should wake the waiter");
    }
}
