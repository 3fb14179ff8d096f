//! Room state for Polyroom.
//!
//! [`RoomStore`] is the client's authoritative view of a room: who is in
//! it, what language each participant speaks, the latest frame from each of
//! their streams, the latest translation, and the saved recordings.
//!
//! The store is a reducer. It changes only through [`RoomStore::apply`],
//! which folds one [`ServerEvent`](polyroom_protocol::ServerEvent) into the
//! state and reports what changed as a [`StateDelta`]. Readers get an owned
//! [`RoomSnapshot`] and never hold a reference into the store.
//!
//! # Key types
//!
//! - [`RoomStore`]: the reducer, owned by exactly one task
//! - [`StateDelta`]: what one event did
//! - [`RoomSnapshot`]: read-only copy handed to observers
//! - [`Participant`], [`Snapshot`]: the entries the store keeps

mod delta;
mod participant;
mod snapshot;
mod store;

pub use delta::StateDelta;
pub use participant::Participant;
pub use snapshot::{RoomSnapshot, Snapshot};
pub use store::RoomStore;
