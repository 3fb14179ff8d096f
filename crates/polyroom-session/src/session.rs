//! Session configuration, join requests, and the lifecycle state machine.

use std::fmt;
use std::time::Duration;

use polyroom_protocol::{RoomCode, UserId};
use polyroom_relay::CadenceConfig;
use tokio::sync::watch;

use crate::SessionError;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long to wait for `joined-room` after sending `join-room`.
    ///
    /// Default: 10 seconds.
    pub join_timeout: Duration,

    /// Capacity of the handle → actor command channel.
    pub command_buffer: usize,

    /// Capacity of the update broadcast. Subscribers that fall further
    /// behind than this skip ahead and should re-read the snapshot.
    pub update_buffer: usize,

    /// Cadence for primary and secondary snapshot adapters.
    pub snapshot_cadence: CadenceConfig,

    /// Cadence for the transcript adapter.
    pub transcript_cadence: CadenceConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            join_timeout: Duration::from_secs(10),
            command_buffer: 32,
            update_buffer: 256,
            snapshot_cadence: CadenceConfig::default(),
            transcript_cadence: CadenceConfig {
                interval: Duration::from_millis(250),
                ..CadenceConfig::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// JoinRequest
// ---------------------------------------------------------------------------

/// Who is joining which room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub room_code: RoomCode,
    pub user_id: UserId,
    /// Display name shown to peers.
    pub name: String,
    /// Language this participant wants translations into.
    pub language: String,
}

impl JoinRequest {
    pub fn new(
        room_code: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            room_code: RoomCode::new(room_code),
            user_id: UserId::new(user_id),
            name: name.into(),
            language: language.into(),
        }
    }

    /// Rejects requests the relay could not route.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.room_code.is_blank() {
            return Err(SessionError::InvalidRequest("room code is empty".into()));
        }
        if self.user_id.as_str().trim().is_empty() {
            return Err(SessionError::InvalidRequest("user id is empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(SessionError::InvalidRequest("name is empty".into()));
        }
        if self.language.trim().is_empty() {
            return Err(SessionError::InvalidRequest("language is empty".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle state of a session.
///
/// ```text
/// Idle → Connecting → Joining → Joined → Leaving → Closed
/// ```
///
/// - **Connecting**: opening the transport. Fails to `Closed`.
/// - **Joining**: `join-room` sent, waiting for the acknowledgment. Times
///   out or is rejected to `Closed`.
/// - **Joined**: steady state. Adapters send only here.
/// - **Leaving**: explicit close in progress; `leave-room` is being sent.
/// - **Closed**: terminal. Nothing is sent or received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Connecting,
    Joining,
    Joined,
    Leaving,
    Closed,
}

impl SessionState {
    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Joined)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` if moving to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        use SessionState::*;
        matches!(
            (self, target),
            (Idle, Connecting)
                | (Connecting, Joining)
                | (Connecting, Closed)
                | (Joining, Joined)
                | (Joining, Closed)
                | (Joined, Leaving)
                | (Joined, Closed)
                | (Leaving, Closed)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Joining => write!(f, "Joining"),
            Self::Joined => write!(f, "Joined"),
            Self::Leaving => write!(f, "Leaving"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

// ---------------------------------------------------------------------------
// StateCell
// ---------------------------------------------------------------------------

/// The single writer of a session's state. Readers hold receivers.
#[derive(Debug)]
pub(crate) struct StateCell {
    room: RoomCode,
    tx: watch::Sender<SessionState>,
}

impl StateCell {
    pub(crate) fn new(room: RoomCode) -> Self {
        let (tx, _) = watch::channel(SessionState::Idle);
        Self { room, tx }
    }

    pub(crate) fn get(&self) -> SessionState {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Moves to `to`, enforcing the transition table.
    pub(crate) fn advance(&self, to: SessionState) -> Result<(), SessionError> {
        let from = self.get();
        if !from.can_transition_to(to) {
            return Err(SessionError::InvalidTransition { from, to });
        }
        self.tx.send_replace(to);
        tracing::info!(room = %self.room, %from, %to, "session state changed");
        Ok(())
    }

    /// Moves to `Closed` from wherever the session is. No-op if already
    /// closed.
    pub(crate) fn close(&self) {
        let from = self.get();
        if from.is_closed() {
            return;
        }
        self.tx.send_replace(SessionState::Closed);
        tracing::info!(room = %self.room, %from, to = %SessionState::Closed, "session state changed");
    }
}
