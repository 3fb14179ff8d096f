//! The session's write side, shared by the actor, the handle, and adapters.

use std::sync::Arc;

use polyroom_protocol::{ClientEvent, Codec};
use polyroom_relay::{EventSink, RelayError};
use polyroom_transport::Connection;
use tokio::sync::watch;

use crate::SessionState;

/// Encodes events and writes them to the connection.
///
/// As an [`EventSink`] it refuses to send unless the session is joined.
/// The actor uses [`Outbound::write`] for `join-room` and `leave-room`,
/// which go out in `Joining` and `Leaving`.
pub(crate) struct Outbound<K, C> {
    conn: Arc<K>,
    codec: Arc<C>,
    state: watch::Receiver<SessionState>,
}

impl<K: Connection, C: Codec> Outbound<K, C> {
    pub(crate) fn new(
        conn: Arc<K>,
        codec: Arc<C>,
        state: watch::Receiver<SessionState>,
    ) -> Self {
        Self { conn, codec, state }
    }

    pub(crate) fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Writes `event` regardless of session state.
    pub(crate) async fn write(&self, event: &ClientEvent) -> Result<(), RelayError> {
        let send_failed = |source: Box<dyn std::error::Error + Send + Sync>| {
            RelayError::Send {
                event: event.name(),
                source,
            }
        };
        let bytes = self
            .codec
            .encode(event)
            .map_err(|e| send_failed(Box::new(e)))?;
        self.conn
            .send(&bytes)
            .await
            .map_err(|e| send_failed(Box::new(e)))?;
        tracing::trace!(event = event.name(), bytes = bytes.len(), "event sent");
        Ok(())
    }
}

impl<K: Connection, C: Codec> EventSink for Outbound<K, C> {
    fn is_connected(&self) -> bool {
        self.state().is_joined()
    }

    async fn send(&self, event: ClientEvent) -> Result<(), RelayError> {
        if !self.is_connected() {
            return Err(RelayError::NotConnected);
        }
        self.write(&event).await
    }
}
