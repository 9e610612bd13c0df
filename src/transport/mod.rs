//! Frame transport layer.
//!
//! This module models the message-passing primitive between the guest
//! frame and the host shell (or a child window). What physically carries
//! the text across the frame boundary is outside the bridge: embedders
//! adapt their real cross-frame channel onto a [`FrameChannel`], and
//! tests drive the host end directly.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | In-process duplex channel and [`pair`] constructor |

// ============================================================================
// Submodules
// ============================================================================

/// In-process duplex frame channel.
pub mod channel;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{FrameChannel, FrameReceiver, FrameSender, pair};
