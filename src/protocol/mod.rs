//! Cross-frame protocol message types.
//!
//! This module defines the message format for communication between the
//! guest frame (this SDK) and the host shell.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`Envelope`] | Guest → Host | Capability call |
//! | [`ResponseEnvelope`] | Host → Guest | Call response |
//!
//! # Command Naming
//!
//! Functions follow `module.methodName` format:
//!
//! - `appInstallDialog.openAppInstallDialog`
//! - `call.startCall`
//! - `media.captureImage`
//!
//! The bare `initialize` handshake is the one unqualified name.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Typed operation table by namespace |
//! | `envelope` | Call and response envelope codec |
//! | `handshake` | Runtime configuration payload |

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by capability namespace.
pub mod command;

/// Call and response envelope codec.
pub mod envelope;

/// Handshake payload types.
pub mod handshake;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{
    AppInstallDialogCommand, BarCodeConfig, CallCommand, CallModality, Command, CoreCommand,
    MediaCommand, MediaInputs, MediaType, OpenAppInstallDialogParams, StartCallParams,
};
pub use envelope::{Envelope, HostErrorPayload, ResponseEnvelope};
pub use handshake::{RuntimeConfig, SupportDeclaration};
