//! App-install dialog capability.
//!
//! Asks the host shell to show its install dialog for a given app. The
//! dialog has no payload to return; a successful response resolves to
//! unit.

// ============================================================================
// Imports
// ============================================================================

use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::protocol::{AppInstallDialogCommand, Command, OpenAppInstallDialogParams};

// ============================================================================
// Operations
// ============================================================================

/// Whether the current host supports the app-install dialog.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] before the handshake completes.
pub fn is_supported(bridge: &Bridge) -> Result<bool> {
    bridge.is_capability_supported("appInstallDialog")
}

/// Opens the host's app-install dialog.
///
/// Resolves once the host dismisses the dialog; the host returns no
/// payload.
///
/// # Errors
///
/// - [`Error::Validation`] if `app_id` is empty
/// - [`Error::NotSupported`] if the host lacks the capability
/// - [`Error::Host`] if the host reported a failure
pub async fn open_app_install_dialog(
    bridge: &Bridge,
    params: OpenAppInstallDialogParams,
) -> Result<()> {
    if params.app_id.is_empty() {
        return Err(Error::validation("appId must not be empty"));
    }

    let reply = bridge.call(Command::AppInstallDialog(AppInstallDialogCommand::Open(
        params,
    )))?;
    reply.response().await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport;

    #[tokio::test]
    async fn test_empty_app_id_rejected_before_gating() {
        let (guest, _host) = transport::pair();
        let bridge = Bridge::new(guest);

        // Validation fires even on an uninitialized bridge.
        let params = OpenAppInstallDialogParams {
            app_id: String::new(),
        };
        let err = open_app_install_dialog(&bridge, params).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(bridge.pending_count(), 0);
    }
}
