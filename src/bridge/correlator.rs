//! Request/response correlation table.
//!
//! Every outbound call registers a pending entry keyed by its message ID;
//! a correlated response settles the entry exactly once. Uncorrelated,
//! duplicate, and late responses are logged and discarded — the host is
//! an out-of-process, independently-versioned peer and may respond
//! twice, never, or after the bridge has already reset.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::identifiers::{ChildWindowId, MessageId};
use crate::protocol::ResponseEnvelope;

// ============================================================================
// Route
// ============================================================================

/// Which peer a pending call is awaiting.
///
/// Host calls and child-window calls share one correlation table but
/// travel on distinct channels; the route lets a child closing settle
/// only its own calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The primary host frame.
    Host,
    /// An attached child window.
    Child(ChildWindowId),
}

// ============================================================================
// PendingCall
// ============================================================================

/// One registered call awaiting settlement.
///
/// Owned exclusively by the correlator from registration until
/// settlement; the oneshot sender makes a second settlement impossible
/// by construction.
struct PendingCall {
    tx: oneshot::Sender<Result<ResponseEnvelope>>,
    route: Route,
}

// ============================================================================
// Correlator
// ============================================================================

/// Pending-call table mapping message IDs to settlement channels.
///
/// Thread-safe; shared between the caller-facing API and the bridge
/// event loop. Responses may arrive in any order relative to requests.
#[derive(Default)]
pub struct Correlator {
    table: Mutex<FxHashMap<MessageId, PendingCall>>,
}

impl Correlator {
    /// Creates an empty correlator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pending call and returns its settlement receiver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the ID is already pending. The
    /// codec guarantees unique IDs, so a duplicate is an internal
    /// invariant violation.
    pub fn register(
        &self,
        id: MessageId,
        route: Route,
    ) -> Result<oneshot::Receiver<Result<ResponseEnvelope>>> {
        let (tx, rx) = oneshot::channel();
        let mut table = self.table.lock();

        if table.contains_key(&id) {
            error!(%id, "Duplicate message id registered");
            return Err(Error::protocol(format!("Duplicate message id: {id}")));
        }

        table.insert(id, PendingCall { tx, route });
        Ok(rx)
    }

    /// Settles a pending call with a response envelope.
    ///
    /// An absent ID is discarded (logged, not an error): late responses
    /// after timeout or reset, and spurious host messages, land here.
    pub fn settle(&self, response: ResponseEnvelope) {
        let id = response.id;
        let entry = self.table.lock().remove(&id);

        match entry {
            Some(pending) => {
                // Receiver may have been dropped; nothing left to notify.
                let _ = pending.tx.send(Ok(response));
            }
            None => {
                warn!(%id, "Response for unknown call discarded");
            }
        }
    }

    /// Settles a pending call with an error.
    pub fn settle_error(&self, id: MessageId, err: Error) {
        let entry = self.table.lock().remove(&id);

        match entry {
            Some(pending) => {
                let _ = pending.tx.send(Err(err));
            }
            None => {
                warn!(%id, "Error settlement for unknown call discarded");
            }
        }
    }

    /// Removes a pending entry without settling it.
    ///
    /// Used for timeout cleanup after the caller has stopped listening.
    /// Returns `true` if an entry was removed.
    pub fn remove(&self, id: MessageId) -> bool {
        self.table.lock().remove(&id).is_some()
    }

    /// Settles every pending call with an error from `reason`.
    ///
    /// Used on bridge teardown so no caller is left unresolved forever.
    pub fn cancel_all(&self, reason: impl Fn() -> Error) {
        let pending: Vec<_> = {
            let mut table = self.table.lock();
            table.drain().collect()
        };
        let count = pending.len();

        for (_, call) in pending {
            let _ = call.tx.send(Err(reason()));
        }

        if count > 0 {
            debug!(count, "Cancelled pending calls");
        }
    }

    /// Settles every call awaiting the given child window.
    pub fn cancel_child(&self, child_id: ChildWindowId, reason: impl Fn() -> Error) {
        let affected: Vec<_> = {
            let mut table = self.table.lock();
            let ids: Vec<MessageId> = table
                .iter()
                .filter(|(_, call)| call.route == Route::Child(child_id))
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| table.remove(&id).map(|call| (id, call)))
                .collect()
        };

        let count = affected.len();
        for (_, call) in affected {
            let _ = call.tx.send(Err(reason()));
        }

        if count > 0 {
            debug!(%child_id, count, "Cancelled calls awaiting closed child");
        }
    }

    /// Returns the number of pending calls.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.table.lock().len()
    }

    /// Returns `true` if the ID is still pending.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: MessageId) -> bool {
        self.table.lock().contains_key(&id)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_settle() {
        let correlator = Correlator::new();
        let id = MessageId::generate();

        let rx = correlator.register(id, Route::Host).expect("register");
        assert_eq!(correlator.pending_count(), 1);

        correlator.settle(ResponseEnvelope::success(id, None));
        assert_eq!(correlator.pending_count(), 0);

        let response = rx.await.expect("settled").expect("success");
        assert_eq!(response.id, id);
    }

    #[tokio::test]
    async fn test_duplicate_register_fails() {
        let correlator = Correlator::new();
        let id = MessageId::generate();

        let _rx = correlator.register(id, Route::Host).expect("register");
        let err = correlator.register(id, Route::Host).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
        // The original entry is untouched.
        assert_eq!(correlator.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_response_discarded() {
        let correlator = Correlator::new();
        let id = MessageId::generate();
        let _rx = correlator.register(id, Route::Host).expect("register");

        // Settling a different id must not disturb the pending call.
        correlator.settle(ResponseEnvelope::success(MessageId::generate(), None));
        assert_eq!(correlator.pending_count(), 1);
        assert!(correlator.contains(id));
    }

    #[tokio::test]
    async fn test_second_settle_is_noop() {
        let correlator = Correlator::new();
        let id = MessageId::generate();
        let rx = correlator.register(id, Route::Host).expect("register");

        correlator.settle(ResponseEnvelope::success(id, None));
        correlator.settle(ResponseEnvelope::failure(id, 1, None));

        // First settlement wins; table no longer contains the id.
        let response = rx.await.expect("settled").expect("success");
        assert!(!response.is_error());
        assert!(!correlator.contains(id));
    }

    #[tokio::test]
    async fn test_settle_error() {
        let correlator = Correlator::new();
        let id = MessageId::generate();
        let rx = correlator.register(id, Route::Host).expect("register");

        correlator.settle_error(id, Error::timeout(id, 50));

        let err = rx.await.expect("settled").unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let correlator = Correlator::new();
        let a = correlator
            .register(MessageId::generate(), Route::Host)
            .expect("register");
        let b = correlator
            .register(MessageId::generate(), Route::Host)
            .expect("register");

        correlator.cancel_all(|| Error::BridgeReset);
        assert_eq!(correlator.pending_count(), 0);

        for rx in [a, b] {
            let err = rx.await.expect("settled").unwrap_err();
            assert!(matches!(err, Error::BridgeReset));
        }
    }

    #[tokio::test]
    async fn test_cancel_child_leaves_host_calls() {
        let correlator = Correlator::new();
        let child = ChildWindowId::next();

        let host_id = MessageId::generate();
        let child_id = MessageId::generate();
        let _host_rx = correlator.register(host_id, Route::Host).expect("register");
        let child_rx = correlator
            .register(child_id, Route::Child(child))
            .expect("register");

        correlator.cancel_child(child, || Error::child_closed(child));

        assert!(correlator.contains(host_id));
        assert!(!correlator.contains(child_id));

        let err = child_rx.await.expect("settled").unwrap_err();
        assert!(matches!(err, Error::ChildClosed { .. }));
    }

    #[tokio::test]
    async fn test_remove_without_settling() {
        let correlator = Correlator::new();
        let id = MessageId::generate();
        let _rx = correlator.register(id, Route::Host).expect("register");

        assert!(correlator.remove(id));
        assert!(!correlator.remove(id));
        assert_eq!(correlator.pending_count(), 0);
    }
}
