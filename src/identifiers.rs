//! Type-safe identifiers for bridge entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! | Identifier | Purpose |
//! |------------|---------|
//! | [`MessageId`] | Request/response correlation token |
//! | [`ChildWindowId`] | Attached child window (popup) |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// MessageId
// ============================================================================

/// Unique identifier correlating a request envelope with its response.
///
/// Generated once per outbound call and never reused for the lifetime of
/// the bridge session. A random token rather than a counter: uniqueness
/// survives bridge resets without a reused-id hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Generates a fresh unique message ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The nil ID, reserved for messages outside normal correlation.
    #[inline]
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Returns `true` if this is the nil ID.
    #[inline]
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// ChildWindowId
// ============================================================================

/// Identifier for a child window (popup) attached to the bridge.
///
/// Assigned locally when the child is attached. The bridge does not own the
/// window; the ID only keys the relay registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChildWindowId(u32);

/// Process-wide counter for child window IDs.
static NEXT_CHILD_WINDOW_ID: AtomicU32 = AtomicU32::new(1);

impl ChildWindowId {
    /// Returns the next child window ID (starts at 1).
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_CHILD_WINDOW_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a child window ID from a raw value, rejecting 0.
    #[inline]
    #[must_use]
    pub fn from_u32(raw: u32) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ChildWindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "child-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
