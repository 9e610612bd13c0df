//! Child-window relay registry.
//!
//! Some capabilities open a secondary popup window. The bridge does not
//! own the popup's lifecycle; it only holds the sender half of the
//! child's frame channel, keyed by [`ChildWindowId`], and relays
//! envelopes in both directions. Responses arriving from a child feed
//! the same correlation table as host responses; when the child's
//! channel closes, every call still awaiting that child is settled with
//! a child-closed error and the handle is removed, never leaked.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::identifiers::ChildWindowId;
use crate::transport::{FrameReceiver, FrameSender};

use super::core::BridgeCommand;
use super::correlator::Route;

// ============================================================================
// ChildRegistry
// ============================================================================

/// Sender handles for attached child windows, keyed by child identity.
///
/// Owned by the bridge event loop; a weak back-relation only. The
/// `closed` observation arrives through the child's forwarder task, not
/// through this registry.
#[derive(Default)]
pub(crate) struct ChildRegistry {
    children: FxHashMap<ChildWindowId, FrameSender>,
}

impl ChildRegistry {
    /// Registers a child's sender half.
    pub(crate) fn attach(&mut self, child_id: ChildWindowId, sender: FrameSender) {
        debug!(%child_id, "Child window attached");
        self.children.insert(child_id, sender);
    }

    /// Removes a child's sender half.
    ///
    /// Returns `true` if the child was registered.
    pub(crate) fn detach(&mut self, child_id: ChildWindowId) -> bool {
        let removed = self.children.remove(&child_id).is_some();
        if removed {
            debug!(%child_id, "Child window detached");
        }
        removed
    }

    /// Looks up a child's sender half.
    pub(crate) fn sender(&self, child_id: ChildWindowId) -> Option<&FrameSender> {
        self.children.get(&child_id)
    }

    /// Returns the number of attached children.
    pub(crate) fn len(&self) -> usize {
        self.children.len()
    }

    /// Drops every handle (bridge reset or shutdown).
    pub(crate) fn clear(&mut self) {
        self.children.clear();
    }
}

// ============================================================================
// Forwarder
// ============================================================================

/// Spawns the relay task for one child window.
///
/// Forwards inbound child messages into the bridge event loop; when the
/// child's channel ends (popup closed), reports the closure and exits.
pub(crate) fn spawn_child_forwarder(
    child_id: ChildWindowId,
    mut receiver: FrameReceiver,
    command_tx: mpsc::UnboundedSender<BridgeCommand>,
) {
    tokio::spawn(async move {
        while let Some(text) = receiver.recv().await {
            trace!(%child_id, "Inbound child message");
            if command_tx
                .send(BridgeCommand::Inbound {
                    origin: Route::Child(child_id),
                    text,
                })
                .is_err()
            {
                return;
            }
        }

        debug!(%child_id, "Child channel closed");
        let _ = command_tx.send(BridgeCommand::PeerClosed {
            origin: Route::Child(child_id),
        });
    });
}

// ============================================================================
// Tests
// ============================================================================
