//! Error types for the host bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use host_bridge::{Result, Bridge};
//! use host_bridge::capabilities::app_install_dialog;
//! use host_bridge::protocol::OpenAppInstallDialogParams;
//!
//! async fn example(bridge: &Bridge) -> Result<()> {
//!     let params = OpenAppInstallDialogParams { app_id: "0".into() };
//!     app_install_dialog::open_app_install_dialog(bridge, params).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Lifecycle | [`Error::NotInitialized`], [`Error::InitializationFailed`], [`Error::BridgeReset`] |
//! | Gating | [`Error::NotSupported`], [`Error::Validation`] |
//! | Protocol | [`Error::Protocol`], [`Error::Host`] |
//! | Timing | [`Error::Timeout`], [`Error::HandshakeTimeout`] |
//! | Relay | [`Error::ChildClosed`], [`Error::ChannelClosed`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::{ChildWindowId, MessageId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Call attempted before any handshake started.
    ///
    /// Returned when the bridge is used before [`initialize`] was called,
    /// or when the capability matrix is queried before negotiation.
    ///
    /// [`initialize`]: crate::bridge::Bridge::initialize
    #[error("The library has not yet been initialized")]
    NotInitialized,

    /// Handshake with the host failed.
    ///
    /// Terminal for every call queued at the time of failure. Recovery
    /// requires an explicit reset followed by re-initialization.
    #[error("Initialization failed: {message}")]
    InitializationFailed {
        /// Description of the handshake failure.
        message: String,
    },

    /// The bridge was reset while the call was pending.
    ///
    /// Returned for calls cancelled by [`uninitialize`].
    ///
    /// [`uninitialize`]: crate::bridge::Bridge::uninitialize
    #[error("The library was reset while the call was pending")]
    BridgeReset,

    // ========================================================================
    // Gating Errors
    // ========================================================================
    /// Capability or function absent from the negotiated matrix.
    ///
    /// Fails fast before any envelope is constructed; no traffic is
    /// generated for unsupported calls.
    #[error("Not supported by the current host: {capability}")]
    NotSupported {
        /// The unsupported capability namespace (or `namespace.function`).
        capability: String,
    },

    /// Caller-supplied arguments are malformed.
    ///
    /// Detected before transmission, surfaced in the caller's own
    /// invocation style.
    #[error("Invalid argument: {message}")]
    Validation {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected message.
    ///
    /// A malformed inbound message is logged and discarded by the event
    /// loop; this variant surfaces only for violations on the caller's
    /// own path (e.g. a malformed handshake payload).
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// The host explicitly reported an error result.
    #[error("Host error {code}: {message}")]
    Host {
        /// Host-reported error code.
        code: i64,
        /// Host-reported error message (empty when the host sent none).
        message: String,
    },

    // ========================================================================
    // Timing Errors
    // ========================================================================
    /// No correlated response within the per-call bound.
    ///
    /// The pending entry is removed; a late response is discarded.
    #[error("Call {message_id} timed out after {timeout_ms}ms")]
    Timeout {
        /// The message ID that timed out.
        message_id: MessageId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Handshake response not received within the configured bound.
    #[error("Handshake timeout after {timeout_ms}ms")]
    HandshakeTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Relay Errors
    // ========================================================================
    /// The child window closed before the call settled.
    #[error("Child window {child_id} closed before responding")]
    ChildClosed {
        /// The child window that closed.
        child_id: ChildWindowId,
    },

    /// The frame channel to the host is gone.
    ///
    /// Returned when the bridge event loop has terminated.
    #[error("Frame channel closed")]
    ChannelClosed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an initialization failed error.
    #[inline]
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Creates a not supported error.
    #[inline]
    pub fn not_supported(capability: impl Into<String>) -> Self {
        Self::NotSupported {
            capability: capability.into(),
        }
    }

    /// Creates a validation error.
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a host error.
    #[inline]
    pub fn host(code: i64, message: impl Into<String>) -> Self {
        Self::Host {
            code,
            message: message.into(),
        }
    }

    /// Creates a call timeout error.
    #[inline]
    pub fn timeout(message_id: MessageId, timeout_ms: u64) -> Self {
        Self::Timeout {
            message_id,
            timeout_ms,
        }
    }

    /// Creates a handshake timeout error.
    #[inline]
    pub fn handshake_timeout(timeout_ms: u64) -> Self {
        Self::HandshakeTimeout { timeout_ms }
    }

    /// Creates a child closed error.
    #[inline]
    pub fn child_closed(child_id: ChildWindowId) -> Self {
        Self::ChildClosed { child_id }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::HandshakeTimeout { .. })
    }

    /// Returns `true` if this is a lifecycle error.
    ///
    /// Lifecycle errors reflect bridge state, not the individual call.
    #[inline]
    #[must_use]
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized | Self::InitializationFailed { .. } | Self::BridgeReset
        )
    }

    /// Returns `true` if this error was detected before any envelope
    /// was constructed.
    #[inline]
    #[must_use]
    pub fn is_pre_transmission(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized | Self::NotSupported { .. } | Self::Validation { .. }
        )
    }

    /// Returns `true` if this error may succeed on retry after
    /// re-initialization.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::HandshakeTimeout { .. }
                | Self::InitializationFailed { .. }
                | Self::BridgeReset
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_initialized_display() {
        let err = Error::NotInitialized;
        assert_eq!(err.to_string(), "The library has not yet been initialized");
    }

    #[test]
    fn test_not_supported_display() {
        let err = Error::not_supported("appInstallDialog");
        assert_eq!(
            err.to_string(),
            "Not supported by the current host: appInstallDialog"
        );
    }

    #[test]
    fn test_host_error_display() {
        let err = Error::host(500, "internal failure");
        assert_eq!(err.to_string(), "Host error 500: internal failure");
    }

    #[test]
    fn test_is_timeout() {
        let timeout = Error::timeout(MessageId::generate(), 5000);
        let handshake = Error::handshake_timeout(3000);
        let other = Error::validation("bad input");

        assert!(timeout.is_timeout());
        assert!(handshake.is_timeout());
        assert!(!other.is_timeout());
    }

    #[test]
    fn test_is_lifecycle_error() {
        assert!(Error::NotInitialized.is_lifecycle_error());
        assert!(Error::BridgeReset.is_lifecycle_error());
        assert!(Error::initialization_failed("no host").is_lifecycle_error());
        assert!(!Error::validation("bad input").is_lifecycle_error());
    }

    #[test]
    fn test_is_pre_transmission() {
        assert!(Error::NotInitialized.is_pre_transmission());
        assert!(Error::not_supported("media").is_pre_transmission());
        assert!(Error::validation("targets is required").is_pre_transmission());
        assert!(!Error::BridgeReset.is_pre_transmission());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::handshake_timeout(1000).is_recoverable());
        assert!(Error::BridgeReset.is_recoverable());
        assert!(!Error::not_supported("call").is_recoverable());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
