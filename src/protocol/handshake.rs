//! Handshake payload types.
//!
//! The bridge opens every session with an `initialize` call; the host
//! answers with a runtime configuration naming its protocol version and
//! the capabilities this host build supports. A missing or malformed
//! payload fails initialization.
//!
//! # Format
//!
//! ```json
//! {
//!   "apiVersion": 1,
//!   "supports": {
//!     "appInstallDialog": {},
//!     "call": true,
//!     "media": ["captureImage", "selectMedia"]
//!   }
//! }
//! ```
//!
//! A `supports` value of `true` or `{}` declares the entire namespace;
//! an array declares individual function names.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

// ============================================================================
// SupportDeclaration
// ============================================================================

/// How the host declares support for one capability namespace.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SupportDeclaration {
    /// `true` supports the whole namespace; `false` is treated as absent.
    Flag(bool),
    /// Individual function names within the namespace.
    Functions(Vec<String>),
    /// Empty object form: entire namespace. Non-empty objects carry
    /// host-internal detail the bridge does not interpret.
    Namespace(Map<String, Value>),
}

// ============================================================================
// RuntimeConfig
// ============================================================================

/// Runtime configuration the host returns from the handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Host protocol version marker.
    #[serde(rename = "apiVersion")]
    pub api_version: u32,

    /// Declared capability support by namespace.
    #[serde(default)]
    pub supports: Map<String, Value>,
}

impl RuntimeConfig {
    /// Parses the handshake response result into a runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the payload is missing or does not
    /// carry a version marker and supports table.
    pub fn parse(result: Value) -> Result<Self> {
        if result.is_null() {
            return Err(Error::protocol("Handshake response carried no payload"));
        }

        serde_json::from_value(result)
            .map_err(|e| Error::protocol(format!("Malformed handshake payload: {e}")))
    }

    /// Interprets one namespace's raw declaration.
    ///
    /// Returns `None` when the declaration denies support.
    #[must_use]
    pub fn declaration(value: &Value) -> Option<SupportDeclaration> {
        match serde_json::from_value(value.clone()) {
            Ok(SupportDeclaration::Flag(false)) | Err(_) => None,
            Ok(decl) => Some(decl),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
