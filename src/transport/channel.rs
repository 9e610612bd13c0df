//! In-process duplex frame channel.
//!
//! A [`FrameChannel`] is one end of an asynchronous, untyped, one-way-at-
//! a-time message link: text messages go out through the sender half and
//! arrive through the receiver half. [`pair`] wires two ends together,
//! one for the guest frame and one for the host (or a child window).
//!
//! Delivery is in-order per direction and unbounded; a dropped peer shows
//! up as a send error on one side and end-of-stream on the other.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;

use crate::error::{Error, Result};

// ============================================================================
// FrameSender
// ============================================================================

/// Outbound half of a frame channel.
#[derive(Debug, Clone)]
pub struct FrameSender {
    tx: mpsc::UnboundedSender<String>,
}

impl FrameSender {
    /// Sends one text message to the peer frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the peer is gone.
    pub fn send(&self, text: impl Into<String>) -> Result<()> {
        self.tx
            .send(text.into())
            .map_err(|_| Error::ChannelClosed)
    }

    /// Returns `true` if the peer end has been dropped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ============================================================================
// FrameReceiver
// ============================================================================

/// Inbound half of a frame channel.
#[derive(Debug)]
pub struct FrameReceiver {
    rx: mpsc::UnboundedReceiver<String>,
}

impl FrameReceiver {
    /// Receives the next text message from the peer frame.
    ///
    /// Returns `None` when the peer end has been dropped and the channel
    /// is drained.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Receives a message without waiting, if one is queued.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

// ============================================================================
// FrameChannel
// ============================================================================

/// One end of a duplex frame link.
#[derive(Debug)]
pub struct FrameChannel {
    /// Outbound half.
    pub sender: FrameSender,
    /// Inbound half.
    pub receiver: FrameReceiver,
}

impl FrameChannel {
    /// Splits the channel into its sender and receiver halves.
    #[inline]
    #[must_use]
    pub fn split(self) -> (FrameSender, FrameReceiver) {
        (self.sender, self.receiver)
    }
}

// ============================================================================
// Constructor
// ============================================================================

/// Creates a connected pair of frame channel ends.
///
/// The first end is conventionally the guest side, the second the host
/// (or child window) side; the pairing itself is symmetric.
#[must_use]
pub fn pair() -> (FrameChannel, FrameChannel) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();

    let a = FrameChannel {
        sender: FrameSender { tx: a_tx },
        receiver: FrameReceiver { rx: a_rx },
    };
    let b = FrameChannel {
        sender: FrameSender { tx: b_tx },
        receiver: FrameReceiver { rx: b_rx },
    };

    (a, b)
}

// ============================================================================
// Tests
// ============================================================================
