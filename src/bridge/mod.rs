//! Bridge session layer.
//!
//! Everything between the typed command table and the raw frame channel
//! lives here: the correlation table, the readiness gate with its
//! outbound queue, the negotiated capability matrix, the dual-mode
//! reply handle, and the child-window relay. The [`Bridge`] object ties
//! them together behind one event loop.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `capability` | Negotiated capability matrix |
//! | `child` | Child-window relay registry |
//! | `core` | Bridge session object and event loop |
//! | `correlator` | Pending-call correlation table |
//! | `gate` | Readiness states and outbound queue |
//! | `invoke` | Awaitable/callback reply handle |

// ============================================================================
// Submodules
// ============================================================================

/// Negotiated capability matrix.
pub mod capability;

/// Child-window relay registry and forwarder.
mod child;

/// Bridge session object and event loop.
pub mod core;

/// Pending-call correlation table.
pub mod correlator;

/// Readiness gate and outbound queue.
pub mod gate;

/// Awaitable/callback reply handle.
pub mod invoke;

// ============================================================================
// Re-exports
// ============================================================================

pub use capability::{CapabilityMatrix, CapabilitySupport};
pub use core::{Bridge, BridgeConfig};
pub use correlator::{Correlator, Route};
pub use gate::{OutboundQueue, ReadinessState};
pub use invoke::PendingReply;
