//! Error types for the session layer.

use std::time::Duration;

use polyroom_protocol::ProtocolError;
use polyroom_relay::RelayError;
use polyroom_transport::TransportError;

use crate::SessionState;

/// Errors that can occur while opening or using a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The join request is missing a room code, user id, or name.
    #[error("invalid join request: {0}")]
    InvalidRequest(String),

    /// Connecting failed, or the connection dropped before the join
    /// was acknowledged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The relay did not acknowledge the join in time. Never retried.
    #[error("relay did not acknowledge join within {0:?}")]
    JoinTimeout(Duration),

    /// The relay refused the join (`room-full` or `error`).
    #[error("relay rejected join: {0}")]
    Rejected(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    /// The session has been closed.
    #[error("session is closed")]
    Closed,

    /// The operation needs a joined session.
    #[error("session is not joined (state: {0})")]
    NotJoined(SessionState),

    /// A lifecycle transition the state machine does not allow.
    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition { from: SessionState, to: SessionState },
}
