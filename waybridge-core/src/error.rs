//! Bridge error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::handle::Handle;

/// Errors surfaced by the bridge.
///
/// Stale events and unsupported globals are recovered locally and never show
/// up here; see [`Diagnostics`](crate::bridge::Diagnostics).
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The server or the caller broke the protocol's ordering rules.
    #[error("Wayland protocol violation: {0}")]
    ProtocolViolation(String),

    /// The display socket closed or failed.
    #[error("Wayland connection lost: {0}")]
    ConnectionLost(String),

    /// A global the operation depends on was never advertised.
    #[error("Required global {0} is not available")]
    MissingGlobal(&'static str),

    /// A frame callback was requested while the previous one is outstanding.
    #[error("Frame callback already pending for surface {0:?}")]
    FrameCallbackPending(Handle),

    /// The caller referenced an object that no longer exists.
    #[error("Unknown or destroyed object {0:?}")]
    UnknownObject(Handle),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BridgeError {
    /// Whether the error ends the connection.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BridgeError::ProtocolViolation(_) | BridgeError::ConnectionLost(_)
        )
    }
}
