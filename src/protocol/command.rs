//! Command definitions organized by capability namespace.
//!
//! Commands follow the `module.methodName` name contract shared with the
//! host. Dispatch is by function-name string on the host side; on the
//! guest side this is a typed table mapping known operations to string
//! constants.
//!
//! # Command Namespaces
//!
//! | Namespace | Commands |
//! |-----------|----------|
//! | (core) | `initialize` |
//! | `appInstallDialog` | Open the app install dialog |
//! | `call` | Start a call |
//! | `media` | Capture image, select media, scan barcode |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Value, to_value};

use crate::error::Result;
use crate::protocol::Envelope;

// ============================================================================
// Command Wrapper
// ============================================================================

/// All known host operations organized by capability namespace.
///
/// This enum wraps namespace-specific command enums for a unified path
/// into the envelope codec.
#[derive(Debug, Clone)]
pub enum Command {
    /// Core lifecycle commands (never capability-gated).
    Core(CoreCommand),
    /// AppInstallDialog namespace commands.
    AppInstallDialog(AppInstallDialogCommand),
    /// Call namespace commands.
    Call(CallCommand),
    /// Media namespace commands.
    Media(MediaCommand),
}

impl Command {
    /// Wire function name in `module.methodName` format.
    #[must_use]
    pub fn func(&self) -> &'static str {
        match self {
            Self::Core(cmd) => cmd.func(),
            Self::AppInstallDialog(cmd) => cmd.func(),
            Self::Call(cmd) => cmd.func(),
            Self::Media(cmd) => cmd.func(),
        }
    }

    /// Capability namespace gating this command.
    ///
    /// `None` for core commands: the handshake itself must never be gated
    /// against the matrix it negotiates.
    #[must_use]
    pub fn capability(&self) -> Option<&'static str> {
        match self {
            Self::Core(_) => None,
            Self::AppInstallDialog(_) => Some("appInstallDialog"),
            Self::Call(_) => Some("call"),
            Self::Media(_) => Some("media"),
        }
    }

    /// Leaf method name, for function-level matrix entries.
    #[must_use]
    pub fn method(&self) -> &'static str {
        let func = self.func();
        func.rsplit_once('.').map_or(func, |(_, method)| method)
    }

    /// Marshals the typed parameters into the ordered args sequence.
    ///
    /// Args are captured by value: parameters are structurally cloned
    /// into [`Value`]s before the envelope exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if a parameter fails
    /// to serialize.
    pub fn into_args(self) -> Result<Vec<Value>> {
        match self {
            Self::Core(cmd) => cmd.into_args(),
            Self::AppInstallDialog(cmd) => cmd.into_args(),
            Self::Call(cmd) => cmd.into_args(),
            Self::Media(cmd) => cmd.into_args(),
        }
    }

    /// Builds the call envelope for this command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if a parameter fails
    /// to serialize.
    pub fn into_envelope(self) -> Result<Envelope> {
        let func = self.func();
        Ok(Envelope::new(func, self.into_args()?))
    }
}

// ============================================================================
// Core Commands
// ============================================================================

/// Core lifecycle commands.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Handshake: identify the SDK to the host and request the
    /// capability matrix.
    Initialize {
        /// Declared SDK protocol version.
        version: String,
    },
}

impl CoreCommand {
    fn func(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
        }
    }

    fn into_args(self) -> Result<Vec<Value>> {
        match self {
            Self::Initialize { version } => Ok(vec![Value::String(version)]),
        }
    }
}

// ============================================================================
// AppInstallDialog Commands
// ============================================================================

/// Parameters for opening the app install dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAppInstallDialogParams {
    /// Identifier of the app to install.
    #[serde(rename = "appId")]
    pub app_id: String,
}

/// AppInstallDialog namespace commands.
#[derive(Debug, Clone)]
pub enum AppInstallDialogCommand {
    /// Open the host's app install dialog.
    Open(OpenAppInstallDialogParams),
}

impl AppInstallDialogCommand {
    fn func(&self) -> &'static str {
        match self {
            Self::Open(_) => "appInstallDialog.openAppInstallDialog",
        }
    }

    fn into_args(self) -> Result<Vec<Value>> {
        match self {
            Self::Open(params) => Ok(vec![to_value(params)?]),
        }
    }
}

// ============================================================================
// Call Commands
// ============================================================================

/// Modalities a call can be started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallModality {
    /// Unknown modality.
    Unknown,
    /// Audio-only call.
    Audio,
    /// Video call.
    Video,
    /// Video-based screen sharing.
    VideoBasedScreenSharing,
    /// Data-only call.
    Data,
}

/// Parameters for starting a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartCallParams {
    /// Identities to call. Must be a non-empty list.
    pub targets: Vec<String>,

    /// Modalities to request for the call.
    #[serde(
        rename = "requestedModalities",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub requested_modalities: Vec<CallModality>,

    /// Optional source tag attributed to the call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Call namespace commands.
#[derive(Debug, Clone)]
pub enum CallCommand {
    /// Start a call to one or more targets.
    Start(StartCallParams),
}

impl CallCommand {
    fn func(&self) -> &'static str {
        match self {
            Self::Start(_) => "call.startCall",
        }
    }

    fn into_args(self) -> Result<Vec<Value>> {
        match self {
            Self::Start(params) => Ok(vec![to_value(params)?]),
        }
    }
}

// ============================================================================
// Media Commands
// ============================================================================

/// Kinds of media the host can capture or select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaType {
    /// Still image.
    Image,
    /// Video clip.
    Video,
    /// Video or image.
    VideoAndImage,
    /// Audio clip.
    Audio,
}

/// Parameters for selecting media from the host gallery or camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInputs {
    /// Kind of media to select.
    #[serde(rename = "mediaType")]
    pub media_type: MediaType,

    /// Maximum number of items the user may pick. Must be positive.
    #[serde(rename = "maxMediaCount")]
    pub max_media_count: u32,
}

/// Parameters for scanning a barcode through the host camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarCodeConfig {
    /// Seconds before the scan is abandoned. Bounded to 1..=60.
    #[serde(
        rename = "timeOutIntervalInSec",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout_in_seconds: Option<u32>,
}

/// Media namespace commands.
#[derive(Debug, Clone)]
pub enum MediaCommand {
    /// Capture an image with the host camera.
    CaptureImage,
    /// Select media from the host gallery or camera.
    SelectMedia(MediaInputs),
    /// Scan a barcode through the host camera.
    ScanBarCode(BarCodeConfig),
}

impl MediaCommand {
    fn func(&self) -> &'static str {
        match self {
            Self::CaptureImage => "media.captureImage",
            Self::SelectMedia(_) => "media.selectMedia",
            Self::ScanBarCode(_) => "media.scanBarCode",
        }
    }

    fn into_args(self) -> Result<Vec<Value>> {
        match self {
            Self::CaptureImage => Ok(vec![]),
            Self::SelectMedia(params) => Ok(vec![to_value(params)?]),
            Self::ScanBarCode(config) => Ok(vec![to_value(config)?]),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_func_strings() {
        let open = Command::AppInstallDialog(AppInstallDialogCommand::Open(
            OpenAppInstallDialogParams {
                app_id: "0".to_string(),
            },
        ));
        assert_eq!(open.func(), "appInstallDialog.openAppInstallDialog");

        let capture = Command::Media(MediaCommand::CaptureImage);
        assert_eq!(capture.func(), "media.captureImage");

        let init = Command::Core(CoreCommand::Initialize {
            version: "2.0.0".to_string(),
        });
        assert_eq!(init.func(), "initialize");
    }

    #[test]
    fn test_capability_namespaces() {
        let init = Command::Core(CoreCommand::Initialize {
            version: "2.0.0".to_string(),
        });
        assert_eq!(init.capability(), None);

        let start = Command::Call(CallCommand::Start(StartCallParams {
            targets: vec!["user".to_string()],
            requested_modalities: vec![],
            source: None,
        }));
        assert_eq!(start.capability(), Some("call"));
        assert_eq!(start.method(), "startCall");
    }

    #[test]
    fn test_method_of_unqualified_func() {
        let init = Command::Core(CoreCommand::Initialize {
            version: "2.0.0".to_string(),
        });
        assert_eq!(init.method(), "initialize");
    }

    #[test]
    fn test_open_dialog_args_shape() {
        let cmd = Command::AppInstallDialog(AppInstallDialogCommand::Open(
            OpenAppInstallDialogParams {
                app_id: "0".to_string(),
            },
        ));

        let args = cmd.into_args().expect("marshal");
        assert_eq!(args, vec![json!({"appId": "0"})]);
    }

    #[test]
    fn test_start_call_args_camel_case() {
        let cmd = Command::Call(CallCommand::Start(StartCallParams {
            targets: vec!["alice".to_string(), "bob".to_string()],
            requested_modalities: vec![CallModality::Audio, CallModality::Video],
            source: None,
        }));

        let args = cmd.into_args().expect("marshal");
        assert_eq!(
            args,
            vec![json!({
                "targets": ["alice", "bob"],
                "requestedModalities": ["audio", "video"],
            })]
        );
    }

    #[test]
    fn test_capture_image_has_no_args() {
        let cmd = Command::Media(MediaCommand::CaptureImage);
        assert!(cmd.into_args().expect("marshal").is_empty());
    }

    #[test]
    fn test_into_envelope() {
        let cmd = Command::Media(MediaCommand::SelectMedia(MediaInputs {
            media_type: MediaType::Image,
            max_media_count: 5,
        }));

        let envelope = cmd.into_envelope().expect("envelope");
        assert_eq!(envelope.func, "media.selectMedia");
        assert_eq!(envelope.args.len(), 1);
    }
}
