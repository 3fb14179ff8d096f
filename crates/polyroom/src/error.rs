//! Unified error type for the Polyroom client.

use polyroom_protocol::ProtocolError;
use polyroom_relay::{CaptureError, RelayError, ValidationError};
use polyroom_session::SessionError;
use polyroom_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PolyroomError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Connection, send, or receive failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Join timeout, rejection, or an operation on a closed session.
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

impl From<ValidationError> for PolyroomError {
    fn from(err: ValidationError) -> Self {
        Self::Relay(RelayError::Validation(err))
    }
}

impl PolyroomError {
    /// Returns `true` if the relay refused the request.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Session(SessionError::Rejected(_)))
    }
}
