//! # Polyroom
//!
//! Client-side room state sync engine for multilingual relay rooms.
//!
//! A participant joins a room on a relay server, keeps a local mirror of
//! who is in the room and what they are streaming, and pushes periodic
//! snapshots and transcripts back out. The layers live in their own crates
//! and are re-exported here:
//!
//! - [`transport`]: the relay connection (`WebSocket` or in-memory)
//! - [`protocol`]: the wire events and their JSON codec
//! - [`state`]: the room store that folds events into deltas
//! - [`relay`]: cadence-driven capture adapters
//! - [`session`]: join, leave, and the session actor
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use polyroom::prelude::*;
//!
//! # async fn demo() -> Result<(), PolyroomError> {
//! polyroom::init_tracing();
//!
//! let client = RoomClient::from_env()?;
//! let session = client
//!     .join(JoinRequest::new("ABC123", "u1", "Alice", "Spanish"))
//!     .await?;
//!
//! let mut updates = session.subscribe();
//! while let Ok(update) = updates.recv().await {
//!     if let SessionUpdate::Delta(delta) = update {
//!         println!("{delta:?}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;

pub use client::{RoomClient, RoomClientBuilder, RoomSession};
pub use config::{
    ClientConfig, ConfigError, JOIN_TIMEOUT_VAR, RELAY_URL_VAR, SNAPSHOT_INTERVAL_VAR,
    TRANSCRIPT_INTERVAL_VAR,
};
pub use error::PolyroomError;

pub use polyroom_protocol as protocol;
pub use polyroom_relay as relay;
pub use polyroom_session as session;
pub use polyroom_state as state;
pub use polyroom_transport as transport;

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber that honours `RUST_LOG`.
///
/// Falls back to `info` when `RUST_LOG` is unset or invalid. Does nothing
/// if a global subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub mod prelude {
    //! The types most callers need.

    pub use crate::{ClientConfig, PolyroomError, RoomClient, RoomSession};
    pub use polyroom_protocol::{RoomCode, StreamKind, UserId};
    pub use polyroom_relay::{
        ArtifactSource, CaptureError, EncodedFrame, RecordingRequest, SpeechTranscript,
    };
    pub use polyroom_session::{
        AdapterSlot, JoinRequest, SessionHandle, SessionState, SessionUpdate,
    };
    pub use polyroom_state::{Participant, RoomSnapshot, StateDelta};
}
