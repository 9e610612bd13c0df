//! Message envelope types.
//!
//! Defines the envelope format for calls from the guest frame to the host
//! and responses flowing back.
//!
//! # Format
//!
//! Call (guest → host):
//!
//! ```json
//! {
//!   "id": "uuid",
//!   "func": "module.methodName",
//!   "args": [ ... ],
//!   "timestamp": 1700000000000
//! }
//! ```
//!
//! Response (host → guest), exactly one of `result`/`error` populated:
//!
//! ```json
//! { "id": "uuid", "result": { ... } }
//! { "id": "uuid", "error": { "errorCode": 500, "message": "..." } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::MessageId;

// ============================================================================
// Envelope
// ============================================================================

/// A call envelope from the guest frame to the host (or a child window).
///
/// The argument sequence is captured by value at construction time: args
/// are structurally cloned into [`Value`]s, so no live references cross
/// the frame boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Unique identifier for request/response correlation.
    ///
    /// Never reused for the lifetime of the bridge session.
    pub id: MessageId,

    /// Function name in `module.methodName` format.
    pub func: String,

    /// Ordered argument sequence.
    #[serde(default)]
    pub args: Vec<Value>,

    /// Milliseconds since the Unix epoch at construction time.
    pub timestamp: u64,
}

impl Envelope {
    /// Creates a new envelope with a fresh unique ID.
    #[must_use]
    pub fn new(func: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            id: MessageId::generate(),
            func: func.into(),
            args,
            timestamp: now_millis(),
        }
    }

    /// Serializes the envelope to its wire text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a raw inbound payload as a call envelope.
    ///
    /// Used by host-side harnesses to inspect guest traffic.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the payload lacks a recognizable
    /// id or func.
    pub fn decode(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| Error::protocol(format!("Unparseable call envelope: {e}")))
    }
}

// ============================================================================
// HostErrorPayload
// ============================================================================

/// Error payload the host places in a response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostErrorPayload {
    /// Host-defined error code.
    #[serde(rename = "errorCode")]
    pub error_code: i64,

    /// Optional human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// ResponseEnvelope
// ============================================================================

/// A response envelope from the host (or a child window) to the guest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Matches the call envelope `id`.
    pub id: MessageId,

    /// Result data (if success).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error payload (if failure).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<HostErrorPayload>,
}

impl ResponseEnvelope {
    /// Creates a success response.
    #[inline]
    #[must_use]
    pub fn success(id: MessageId, result: Option<Value>) -> Self {
        Self {
            id,
            result,
            error: None,
        }
    }

    /// Creates an error response.
    #[inline]
    #[must_use]
    pub fn failure(id: MessageId, error_code: i64, message: Option<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(HostErrorPayload {
                error_code,
                message,
            }),
        }
    }

    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Serializes the response to its wire text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a raw inbound payload as a response envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the payload lacks a recognizable id.
    pub fn decode(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| Error::protocol(format!("Unparseable response envelope: {e}")))
    }

    /// Extracts the result value, returning an error if the host
    /// reported one.
    ///
    /// An error payload wins if the host populated both fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Host`] if the response carried an error payload.
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(payload) => Err(Error::host(
                payload.error_code,
                payload.message.unwrap_or_default(),
            )),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Milliseconds since the Unix epoch.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
