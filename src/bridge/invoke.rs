//! Dual-mode invocation adapter.
//!
//! Every call has one authoritative result channel (the correlator's
//! oneshot) and two presentation shapes: an awaitable [`PendingReply`],
//! or a single-invocation completion callback. The callback form
//! *consumes* the reply handle, so a callback and an awaitable can never
//! coexist for one call — exactly-once settlement falls out of move
//! semantics rather than runtime bookkeeping.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::debug;

use crate::bridge::correlator::Correlator;
use crate::error::{Error, Result};
use crate::identifiers::MessageId;
use crate::protocol::ResponseEnvelope;

// ============================================================================
// PendingReply
// ============================================================================

/// Handle to one in-flight call.
///
/// Obtained from [`Bridge::call`]; settled exactly once when the
/// correlated response arrives, the call times out, or the bridge is
/// reset. A call with no configured timeout waits indefinitely for a
/// correlated response or a reset.
///
/// [`Bridge::call`]: crate::bridge::Bridge::call
#[must_use = "a pending reply settles nothing until awaited or given a callback"]
pub struct PendingReply {
    id: MessageId,
    rx: oneshot::Receiver<Result<ResponseEnvelope>>,
    correlator: Arc<Correlator>,
}

impl fmt::Debug for PendingReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingReply")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl PendingReply {
    /// Creates a reply handle over a registered correlation entry.
    pub(crate) fn new(
        id: MessageId,
        rx: oneshot::Receiver<Result<ResponseEnvelope>>,
        correlator: Arc<Correlator>,
    ) -> Self {
        Self { id, rx, correlator }
    }

    /// The message ID this reply is correlated under.
    #[inline]
    #[must_use]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Awaits the host's response and extracts its result value.
    ///
    /// # Errors
    ///
    /// - [`Error::Host`] if the host reported an error result
    /// - [`Error::BridgeReset`] if the bridge was reset while pending
    /// - [`Error::ChannelClosed`] if the bridge event loop terminated
    pub async fn response(self) -> Result<Value> {
        match self.rx.await {
            Ok(Ok(envelope)) => envelope.into_result(),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::ChannelClosed),
        }
    }

    /// Awaits the response with a per-call timeout.
    ///
    /// On timeout the pending entry is removed from the correlation
    /// table; a response arriving later is discarded.
    ///
    /// # Errors
    ///
    /// [`Error::Timeout`] on expiry, otherwise as [`response`].
    ///
    /// [`response`]: PendingReply::response
    pub async fn response_within(self, bound: Duration) -> Result<Value> {
        let id = self.id;
        let correlator = Arc::clone(&self.correlator);

        match timeout(bound, self.response()).await {
            Ok(result) => result,
            Err(_) => {
                let removed = correlator.remove(id);
                debug!(%id, removed, "Call timed out");
                Err(Error::timeout(id, bound.as_millis() as u64))
            }
        }
    }

    /// Delivers the outcome to a completion callback instead.
    ///
    /// Consumes the handle; the callback fires exactly once with the
    /// same value an awaiter would have observed.
    pub fn on_complete<F>(self, callback: F)
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        tokio::spawn(async move {
            callback(self.response().await);
        });
    }

    /// Callback form with a per-call timeout.
    pub fn on_complete_within<F>(self, bound: Duration, callback: F)
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        tokio::spawn(async move {
            callback(self.response_within(bound).await);
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
