//! Barcode scanning capability.
//!
//! Scanning rides on the media namespace's `scanBarCode` function, so
//! support here is function-level rather than namespace-level: a host
//! can expose media capture without the scanner.

// ============================================================================
// Imports
// ============================================================================

use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::protocol::{BarCodeConfig, Command, MediaCommand};

// ============================================================================
// Constants
// ============================================================================

/// Scanner timeout bounds, in seconds.
const MIN_TIMEOUT_SECONDS: u32 = 1;
const MAX_TIMEOUT_SECONDS: u32 = 60;

// ============================================================================
// Operations
// ============================================================================

/// Whether the current host supports barcode scanning.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] before the handshake completes.
pub fn is_supported(bridge: &Bridge) -> Result<bool> {
    bridge.is_function_supported("media", "scanBarCode")
}

/// Opens the host's barcode scanner and resolves with the decoded text.
///
/// # Errors
///
/// - [`Error::Validation`] if the configured timeout is outside 1..=60
///   seconds
/// - [`Error::NotSupported`] if the host lacks the scanner
/// - [`Error::Host`] if the host reported a failure
pub async fn scan_bar_code(bridge: &Bridge, config: BarCodeConfig) -> Result<String> {
    if let Some(seconds) = config.timeout_in_seconds
        && !(MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&seconds)
    {
        return Err(Error::validation(format!(
            "scanner timeout must be between {MIN_TIMEOUT_SECONDS} and {MAX_TIMEOUT_SECONDS} seconds"
        )));
    }

    let reply = bridge.call(Command::Media(MediaCommand::ScanBarCode(config)))?;
    let value = reply.response().await?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::protocol("scanBarCode result was not a string"))
}

// ============================================================================
// Tests
// ============================================================================
