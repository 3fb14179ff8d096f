//! The outbound seam between adapters and the session.

use std::future::Future;

use polyroom_protocol::{ClientEvent, RoomCode, UserId};

use crate::RelayError;

/// Where adapters send their events.
///
/// The session implements this over its transport. `is_connected` is
/// `true` only while the session is joined; adapters check it before each
/// capture so they do no work while detached.
pub trait EventSink: Send + Sync + 'static {
    fn is_connected(&self) -> bool;

    /// Sends one event.
    ///
    /// # Errors
    /// [`RelayError::NotConnected`] if the session left the joined state,
    /// [`RelayError::Send`] if the transport failed.
    fn send(
        &self,
        event: ClientEvent,
    ) -> impl Future<Output = Result<(), RelayError>> + Send;
}

/// The room and participant an adapter speaks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub room_code: RoomCode,
    pub user_id: UserId,
}

impl Origin {
    pub fn new(room_code: RoomCode, user_id: UserId) -> Self {
        Self { room_code, user_id }
    }
}
