//! Media capability.
//!
//! Camera capture and gallery selection through the host shell. The
//! capture operation keeps both invocation shapes from the original
//! surface: an awaitable promise form and an error-first completion
//! callback form, both settling from the same correlated response.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::protocol::{Command, MediaCommand, MediaInputs};

// ============================================================================
// Constants
// ============================================================================

/// Upper bound the host accepts for one selection batch.
const MAX_MEDIA_COUNT: u32 = 10;

// ============================================================================
// MediaFile
// ============================================================================

/// One captured or selected media item returned by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    /// Base64-encoded content, or a host-side content reference.
    pub content: String,

    /// Container format, when the host reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// MIME type, when the host reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Size in bytes, when the host reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Decodes the host's result value into media files.
///
/// A `null` result means the user cancelled without selecting anything.
fn decode_files(value: Value) -> Result<Vec<MediaFile>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(value)?)
}

// ============================================================================
// Operations
// ============================================================================

/// Whether the current host supports the media capability.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] before the handshake completes.
pub fn is_supported(bridge: &Bridge) -> Result<bool> {
    bridge.is_capability_supported("media")
}

/// Captures an image with the host's camera. Promise form.
///
/// # Errors
///
/// - [`Error::NotSupported`] if the host lacks the capability
/// - [`Error::Host`] if the host reported a failure
pub async fn capture_image(bridge: &Bridge) -> Result<Vec<MediaFile>> {
    let reply = bridge.call(Command::Media(MediaCommand::CaptureImage))?;
    decode_files(reply.response().await?)
}

/// Captures an image with the host's camera. Callback form.
///
/// The callback fires exactly once with the same outcome the promise
/// form would have resolved with. Pre-transmission failures (not
/// initialized, unsupported) are delivered through the callback as
/// well, so callers handle every error in one place.
pub fn capture_image_with_callback<F>(bridge: &Bridge, callback: F)
where
    F: FnOnce(Result<Vec<MediaFile>>) + Send + 'static,
{
    match bridge.call(Command::Media(MediaCommand::CaptureImage)) {
        Ok(reply) => reply.on_complete(move |outcome| {
            callback(outcome.and_then(decode_files));
        }),
        Err(e) => callback(Err(e)),
    }
}

/// Opens the host's gallery/camera selector.
///
/// # Errors
///
/// - [`Error::Validation`] if `max_media_count` is zero or above the
///   host's batch limit
/// - [`Error::NotSupported`] if the host lacks the capability
/// - [`Error::Host`] if the host reported a failure
pub async fn select_media(bridge: &Bridge, inputs: MediaInputs) -> Result<Vec<MediaFile>> {
    if inputs.max_media_count == 0 || inputs.max_media_count > MAX_MEDIA_COUNT {
        return Err(Error::validation(format!(
            "maxMediaCount must be between 1 and {MAX_MEDIA_COUNT}"
        )));
    }

    let reply = bridge.call(Command::Media(MediaCommand::SelectMedia(inputs)))?;
    decode_files(reply.response().await?)
}

// ============================================================================
// Tests
// ============================================================================
