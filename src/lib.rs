//! Host bridge - cross-frame RPC layer for an embedded guest app.
//!
//! This library implements the guest side of a host/guest RPC bridge:
//! an app embedded inside a host shell (chat/collaboration client)
//! invokes host capabilities over a message-passing boundary and
//! correlates the asynchronous responses back to their callers.
//!
//! # Architecture
//!
//! The bridge follows a session model:
//!
//! - Each [`Bridge`] owns: frame channel + correlation table + event loop
//! - Protocol uses `module.methodName` format over JSON envelopes
//! - Calls issued before the handshake queue FIFO and replay on ready
//! - Capability gating against the matrix negotiated at handshake
//!
//! # Quick Start
//!
//! ```no_run
//! use host_bridge::{Bridge, Result, capabilities::app_install_dialog};
//! use host_bridge::protocol::OpenAppInstallDialogParams;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // The host end of the pair is driven by the embedder.
//!     let (guest, _host) = host_bridge::transport::pair();
//!
//!     let bridge = Bridge::new(guest);
//!     bridge.initialize().await?;
//!
//!     if app_install_dialog::is_supported(&bridge)? {
//!         let params = OpenAppInstallDialogParams { app_id: "0".into() };
//!         app_install_dialog::open_app_install_dialog(&bridge, params).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | Session core: [`Bridge`], correlator, gate, matrix |
//! | [`capabilities`] | Typed wrapper surface, one module per namespace |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Envelope codec and typed command table (internal) |
//! | [`transport`] | In-process frame channel primitive |
//!
//! # Guarantees
//!
//! - **At-most-once settlement**: each call resolves exactly once
//! - **FIFO replay**: queued calls transmit in original order on ready
//! - **Fail-fast gating**: unsupported calls produce zero envelope traffic
//! - **No leaks**: reset and shutdown settle every pending call

// ============================================================================
// Modules
// ============================================================================

/// Bridge session core.
///
/// This module contains the session machinery:
///
/// - [`Bridge`] - Session object (owns the event loop)
/// - [`PendingReply`] - Awaitable/callback handle for one call
/// - [`CapabilityMatrix`] - Negotiated host support table
pub mod bridge;

/// Capability wrapper surface.
///
/// One module per capability namespace; validate, gate, invoke,
/// unmarshal.
pub mod capabilities;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for bridge entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Envelope codec and typed command table.
///
/// Internal module defining call/response structures and the handshake
/// payload.
pub mod protocol;

/// Frame channel primitive.
///
/// In-process duplex channel standing in for the embedder's real
/// message-passing boundary.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Bridge types
pub use bridge::{
    Bridge, BridgeConfig, CapabilityMatrix, CapabilitySupport, PendingReply, ReadinessState,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ChildWindowId, MessageId};
