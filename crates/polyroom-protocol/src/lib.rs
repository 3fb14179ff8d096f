//! Wire protocol for Polyroom.
//!
//! This crate defines what a client and the relay say to each other:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`UserId`], etc.):
//!   the named events that travel on the wire and their payloads.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become bytes.
//! - **Languages** ([`languages`]): the relay's translation targets.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the room
//! store. It knows nothing about connections or membership; it only maps
//! frames to typed events and back.
//!
//! ```text
//! Transport (bytes) → Protocol (ServerEvent) → State (RoomStore)
//! ```

mod codec;
mod error;
pub mod languages;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use languages::{Language, SUPPORTED_LANGUAGES};
pub use types::{
    ClientEvent, ParticipantInfo, Recording, RecordingId, RoomCode,
    ServerEvent, StreamKind, Translation, UserId,
};
