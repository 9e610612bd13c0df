//! Readiness gate and outbound queue.
//!
//! The bridge is not usable until the handshake with the host completes.
//! Calls issued in between are buffered in a strict-FIFO queue and
//! replayed in original order once the host confirms readiness; a failed
//! handshake drains the queue with an initialization error instead.
//! Callers never observe the difference between a queued and a directly
//! transmitted call — only latency differs.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

// ============================================================================
// ReadinessState
// ============================================================================

/// Lifecycle state of the bridge session.
///
/// Transitions only move forward, except that [`Failed`] is terminal
/// from any state on an irrecoverable handshake error and an explicit
/// reset returns the session to [`NotStarted`].
///
/// [`Failed`]: ReadinessState::Failed
/// [`NotStarted`]: ReadinessState::NotStarted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadinessState {
    /// No handshake has been started.
    #[default]
    NotStarted,
    /// Handshake sent, awaiting the host's response.
    AwaitingHandshake,
    /// Handshake complete; calls transmit immediately.
    Ready,
    /// Handshake failed; only an explicit reset recovers.
    Failed,
}

impl ReadinessState {
    /// Returns `true` if the bridge is ready to transmit directly.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns `true` if the transition to `next` is legal.
    ///
    /// Forward-only, plus `Failed` from anywhere and `NotStarted` as the
    /// reset target from anywhere.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::AwaitingHandshake)
                | (Self::AwaitingHandshake, Self::Ready)
                | (_, Self::Failed)
                | (_, Self::NotStarted)
        )
    }
}

// ============================================================================
// OutboundQueue
// ============================================================================

/// Strict-FIFO buffer for calls issued before the bridge is ready.
///
/// Draining yields entries in exact enqueue order, even when some
/// entries were queued before others were capability-checked.
#[derive(Debug)]
pub struct OutboundQueue<T> {
    entries: VecDeque<T>,
}

impl<T> Default for OutboundQueue<T> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }
}

impl<T> OutboundQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry at the back.
    #[inline]
    pub fn push(&mut self, entry: T) {
        self.entries.push_back(entry);
    }

    /// Removes and returns all entries in enqueue order.
    #[must_use]
    pub fn drain(&mut self) -> Vec<T> {
        self.entries.drain(..).collect()
    }

    /// Returns the number of queued entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries are queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_default_state_is_not_started() {
        assert_eq!(ReadinessState::default(), ReadinessState::NotStarted);
        assert!(!ReadinessState::NotStarted.is_ready());
        assert!(ReadinessState::Ready.is_ready());
    }

    #[test]
    fn test_forward_transitions() {
        use ReadinessState::*;

        assert!(NotStarted.can_transition_to(AwaitingHandshake));
        assert!(AwaitingHandshake.can_transition_to(Ready));
        assert!(AwaitingHandshake.can_transition_to(Failed));
        assert!(Ready.can_transition_to(Failed));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        use ReadinessState::*;

        assert!(!Ready.can_transition_to(AwaitingHandshake));
        assert!(!NotStarted.can_transition_to(Ready));
        assert!(!Failed.can_transition_to(Ready));
        assert!(!Failed.can_transition_to(AwaitingHandshake));
    }

    #[test]
    fn test_reset_allowed_from_anywhere() {
        use ReadinessState::*;

        for state in [NotStarted, AwaitingHandshake, Ready, Failed] {
            assert!(state.can_transition_to(NotStarted));
        }
    }

    #[test]
    fn test_queue_fifo() {
        let mut queue = OutboundQueue::new();
        queue.push("a");
        queue.push("b");
        queue.push("c");

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.drain(), vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_drain_empties() {
        let mut queue: OutboundQueue<u32> = OutboundQueue::new();
        queue.push(1);
        let _ = queue.drain();
        assert!(queue.drain().is_empty());
    }

    proptest! {
        /// Draining always preserves enqueue order, for any sequence.
        #[test]
        fn prop_drain_preserves_order(entries in proptest::collection::vec(any::<u32>(), 0..64)) {
            let mut queue = OutboundQueue::new();
            for entry in &entries {
                queue.push(*entry);
            }
            prop_assert_eq!(queue.drain(), entries);
        }
    }
}
