//! Transport abstraction layer for Polyroom.
//!
//! Provides the [`Connector`] and [`Connection`] traits that abstract over
//! how a client reaches the relay. A session owns exactly one connection
//! for the lifetime of its room membership.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client transport via `tokio-tungstenite`
//!
//! The [`memory`] transport is always available; it backs the session tests
//! and any embedding that wants to drive the engine without a network.

mod error;
pub mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

static CONNECTIONS_OPENED: AtomicU64 = AtomicU64::new(0);

/// Tags one relay connection in logs. Unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub(crate) fn next() -> Self {
        Self(CONNECTIONS_OPENED.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "relay#{}", self.0)
    }
}

/// Dials a relay.
pub trait Connector: Send + Sync + 'static {
    type Connection: Connection;

    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// One open link to the relay.
///
/// The session actor waits in [`recv`](Connection::recv) for the whole
/// session while the handle and relay adapters write through
/// [`send`](Connection::send) concurrently.
pub trait Connection: Send + Sync + 'static {
    /// Writes one frame.
    fn send(&self, frame: &[u8]) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Waits for the next frame. `Ok(None)` means the relay closed cleanly.
    fn recv(&self) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the link. Further sends fail.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn id(&self) -> ConnectionId;
}
