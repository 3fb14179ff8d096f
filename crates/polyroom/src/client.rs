//! `RoomClient` builder and join entry point.
//!
//! This ties the layers together: a connector reaches the relay, the
//! session layer joins and owns the room, and the caller gets a
//! [`SessionHandle`].

use std::time::Duration;

use polyroom_session::{JoinRequest, SessionHandle};
use polyroom_transport::{Connector, WebSocketConnection, WebSocketConnector};

use crate::{ClientConfig, PolyroomError};

/// A session joined over WebSocket.
pub type RoomSession = SessionHandle<WebSocketConnection>;

/// Builder for a [`RoomClient`].
///
/// # Example
///
/// ```rust,no_run
/// use polyroom::prelude::*;
///
/// # async fn demo() -> Result<(), PolyroomError> {
/// let client = RoomClient::builder()
///     .relay_url("ws://127.0.0.1:5000")
///     .build();
/// let session = client
///     .join(JoinRequest::new("ABC123", "u1", "Alice", "Spanish"))
///     .await?;
/// session.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoomClientBuilder {
    config: ClientConfig,
}

impl RoomClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn relay_url(mut self, url: impl Into<String>) -> Self {
        self.config.relay_url = url.into();
        self
    }

    pub fn join_timeout(mut self, timeout: Duration) -> Self {
        self.config.join_timeout = timeout;
        self
    }

    pub fn snapshot_interval(mut self, interval: Duration) -> Self {
        self.config.snapshot_interval = interval;
        self
    }

    pub fn transcript_interval(mut self, interval: Duration) -> Self {
        self.config.transcript_interval = interval;
        self
    }

    /// Builds a client that reaches the relay over WebSocket.
    pub fn build(self) -> RoomClient {
        RoomClient {
            connector: WebSocketConnector,
            config: self.config,
        }
    }

    /// Builds a client over a custom connector.
    pub fn build_with<N: Connector>(self, connector: N) -> RoomClient<N> {
        RoomClient {
            connector,
            config: self.config,
        }
    }
}

/// Joins rooms on one relay.
///
/// A client can open any number of sessions; each is independent.
#[derive(Debug)]
pub struct RoomClient<N = WebSocketConnector> {
    connector: N,
    config: ClientConfig,
}

impl RoomClient {
    pub fn builder() -> RoomClientBuilder {
        RoomClientBuilder::new()
    }

    /// A WebSocket client configured from the environment.
    pub fn from_env() -> Result<Self, PolyroomError> {
        Ok(Self::builder().config(ClientConfig::from_env()?).build())
    }
}

impl<N: Connector> RoomClient<N> {
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connects, joins, and returns the running session.
    ///
    /// # Errors
    /// See [`polyroom_session::open`].
    pub async fn join(
        &self,
        request: JoinRequest,
    ) -> Result<SessionHandle<N::Connection>, PolyroomError> {
        tracing::info!(
            url = %self.config.relay_url,
            room = %request.room_code,
            user = %request.user_id,
            "joining room"
        );
        let session = polyroom_session::open(
            &self.connector,
            &self.config.relay_url,
            request,
            self.config.session_config(),
        )
        .await?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_fields() {
        let client = RoomClient::builder()
            .relay_url("ws://relay:9000")
            .join_timeout(Duration::from_secs(3))
            .snapshot_interval(Duration::from_millis(50))
            .build();

        let config = client.config();
        assert_eq!(config.relay_url, "ws://relay:9000");
        assert_eq!(config.join_timeout, Duration::from_secs(3));
        assert_eq!(config.snapshot_interval, Duration::from_millis(50));
        assert_eq!(config.transcript_interval, Duration::from_millis(250));
    }
}
