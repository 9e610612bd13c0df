//! Call capability.
//!
//! Starts an audio/video call to one or more targets through the host
//! shell.

// ============================================================================
// Imports
// ============================================================================

use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::protocol::{CallCommand, Command, StartCallParams};

// ============================================================================
// Operations
// ============================================================================

/// Whether the current host supports starting calls.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] before the handshake completes.
pub fn is_supported(bridge: &Bridge) -> Result<bool> {
    bridge.is_capability_supported("call")
}

/// Starts a call to the given targets.
///
/// Returns `true` if the host launched the call.
///
/// # Errors
///
/// - [`Error::Validation`] if `targets` is empty
/// - [`Error::NotSupported`] if the host lacks the capability
/// - [`Error::Host`] if the host reported a failure
pub async fn start_call(bridge: &Bridge, params: StartCallParams) -> Result<bool> {
    if params.targets.is_empty() {
        return Err(Error::validation("targets must contain at least one entry"));
    }

    let reply = bridge.call(Command::Call(CallCommand::Start(params)))?;
    let value = reply.response().await?;
    Ok(value.as_bool().unwrap_or(false))
}

// ============================================================================
// Tests
// ============================================================================
