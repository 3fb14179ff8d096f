//! In-process transport backed by unbounded channels.
//!
//! [`pair`] returns the client half ([`MemoryConnection`]) and the relay
//! half ([`RelayEnd`]). Whatever the client sends shows up on the relay end
//! and frames pushed by the relay end are what the client receives. Dropping
//! or hanging up the relay end looks like a transport loss to the client.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::{Mutex, mpsc};

use crate::{Connection, ConnectionId, Connector, TransportError};

/// Creates a connected client/relay pair.
pub fn pair() -> (MemoryConnection, RelayEnd) {
    let (to_relay_tx, to_relay_rx) = mpsc::unbounded_channel();
    let (to_client_tx, to_client_rx) = mpsc::unbounded_channel();
    let closes = Arc::new(AtomicUsize::new(0));

    let conn = MemoryConnection {
        id: ConnectionId::next(),
        outbound: to_relay_tx,
        inbound: Mutex::new(to_client_rx),
        closed: AtomicBool::new(false),
        closes: Arc::clone(&closes),
    };
    let relay = RelayEnd {
        sent: to_relay_rx,
        inbound: Some(to_client_tx),
        closes,
    };
    (conn, relay)
}

/// Client half of an in-memory connection.
pub struct MemoryConnection {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    closed: AtomicBool,
    closes: Arc<AtomicUsize>,
}

impl Connection for MemoryConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::ConnectionClosed(
                "memory connection closed locally".into(),
            ));
        }
        self.outbound.send(data.to_vec()).map_err(|_| {
            TransportError::ConnectionClosed("relay end dropped".into())
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(None);
        }
        Ok(self.inbound.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closes.fetch_add(1, Ordering::AcqRel);
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Relay half of an in-memory connection.
pub struct RelayEnd {
    sent: mpsc::UnboundedReceiver<Vec<u8>>,
    inbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    closes: Arc<AtomicUsize>,
}

impl RelayEnd {
    /// Waits for the next frame the client sent.
    ///
    /// Returns `None` once the client connection is dropped.
    pub async fn next_sent(&mut self) -> Option<Vec<u8>> {
        self.sent.recv().await
    }

    /// Returns a frame the client already sent, without waiting.
    pub fn try_next_sent(&mut self) -> Option<Vec<u8>> {
        self.sent.try_recv().ok()
    }

    /// Delivers a frame to the client. Returns `false` after a hang-up or
    /// once the client connection is gone.
    pub fn push(&self, frame: impl Into<Vec<u8>>) -> bool {
        match &self.inbound {
            Some(tx) => tx.send(frame.into()).is_ok(),
            None => false,
        }
    }

    /// Simulates the relay dropping the connection.
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }

    /// How many times the client called `close`, repeats included.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::Acquire)
    }
}

/// A [`Connector`] that hands out a single pre-built [`MemoryConnection`].
///
/// A second `connect`, or a connector built with
/// [`MemoryConnector::unreachable`], fails with
/// [`TransportError::ConnectFailed`].
pub struct MemoryConnector {
    conn: std::sync::Mutex<Option<MemoryConnection>>,
}

impl MemoryConnector {
    /// Wraps a connection to be returned by the first `connect` call.
    pub fn new(conn: MemoryConnection) -> Self {
        Self {
            conn: std::sync::Mutex::new(Some(conn)),
        }
    }

    /// A connector whose every `connect` fails.
    pub fn unreachable() -> Self {
        Self {
            conn: std::sync::Mutex::new(None),
        }
    }
}

impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(
        &self,
        url: &str,
    ) -> Result<Self::Connection, TransportError> {
        let taken = match self.conn.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        taken.ok_or_else(|| TransportError::ConnectFailed {
            url: url.to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "no memory connection available",
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (conn, mut relay) = pair();

        conn.send(b"to relay").await.unwrap();
        assert_eq!(relay.next_sent().await.unwrap(), b"to relay");

        assert!(relay.push(b"to client".to_vec()));
        assert_eq!(conn.recv().await.unwrap().unwrap(), b"to client");
    }

    #[tokio::test]
    async fn test_hang_up_ends_recv_cleanly() {
        let (conn, mut relay) = pair();
        relay.hang_up();
        assert!(conn.recv().await.unwrap().is_none());
        assert!(!relay.push(b"late".to_vec()));
    }

    #[tokio::test]
    async fn test_close_counts_every_call() {
        let (conn, relay) = pair();
        conn.close().await.unwrap();
        assert_eq!(relay.close_count(), 1);
        conn.close().await.unwrap();
        assert_eq!(relay.close_count(), 2);
        assert!(conn.send(b"after close").await.is_err());
    }

    #[tokio::test]
    async fn test_connector_hands_out_one_connection() {
        let (conn, _relay) = pair();
        let connector = MemoryConnector::new(conn);
        assert!(connector.connect("mem://relay").await.is_ok());
        let second = connector.connect("mem://relay").await;
        assert!(matches!(
            second,
            Err(TransportError::ConnectFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_connector_fails() {
        let connector = MemoryConnector::unreachable();
        assert!(connector.connect("mem://nowhere").await.is_err());
    }
}
