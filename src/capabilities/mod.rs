//! Capability wrapper surface.
//!
//! Thin, typed entry points over the bridge, one module per capability
//! namespace. Every wrapper follows the same shape: validate arguments
//! locally, let the bridge gate against the negotiated matrix, build
//! the typed command, invoke, and unmarshal the host's result value.
//! Validation failures never produce envelope traffic.
//!
//! # Modules
//!
//! | Module | Namespace | Operations |
//! |--------|-----------|------------|
//! | `app_install_dialog` | `appInstallDialog` | `openAppInstallDialog` |
//! | `call` | `call` | `startCall` |
//! | `media` | `media` | `captureImage`, `selectMedia` |
//! | `bar_code` | `media` (function-level) | `scanBarCode` |

// ============================================================================
// Submodules
// ============================================================================

/// App-install dialog capability.
pub mod app_install_dialog;

/// Barcode scanning capability.
pub mod bar_code;

/// Call capability.
pub mod call;

/// Media capture and selection capability.
pub mod media;

// ============================================================================
// Re-exports
// ============================================================================

pub use media::MediaFile;
