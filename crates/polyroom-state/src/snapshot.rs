//! Stored frames and the read-only room view.

use std::sync::Arc;

use polyroom_protocol::{Recording, RoomCode, StreamKind, Translation, UserId};

use crate::Participant;

/// The latest frame one participant sent on one stream.
///
/// Frames are shared (`Arc<str>`) so copying a [`RoomSnapshot`] does not
/// copy image data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub user_id: UserId,
    pub kind: StreamKind,
    /// Opaque encoded image, usually a `data:` URL.
    pub frame: Arc<str>,
    /// Store-local arrival order. Not a wire value.
    pub seq: u64,
}

/// Picks the secondary stream to surface: the one that arrived last.
pub(crate) fn latest_secondary<'a>(
    snapshots: impl Iterator<Item = &'a Snapshot>,
) -> Option<&'a Snapshot> {
    snapshots
        .filter(|s| s.kind == StreamKind::Secondary)
        .max_by_key(|s| s.seq)
}

/// An owned copy of the store's state at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room_code: RoomCode,
    pub local_user: UserId,
    /// In order of arrival.
    pub participants: Vec<Participant>,
    pub snapshots: Vec<Snapshot>,
    pub latest_translation: Option<Translation>,
    /// Newest first.
    pub recordings: Vec<Recording>,
}

impl RoomSnapshot {
    pub fn participant(&self, id: &UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.participant(id).is_some()
    }

    pub fn local_participant(&self) -> Option<&Participant> {
        self.participant(&self.local_user)
    }

    pub fn snapshot(&self, id: &UserId, kind: StreamKind) -> Option<&Snapshot> {
        self.snapshots
            .iter()
            .find(|s| &s.user_id == id && s.kind == kind)
    }

    /// The secondary stream currently surfaced, if any.
    pub fn active_secondary(&self) -> Option<&Snapshot> {
        latest_secondary(self.snapshots.iter())
    }

    pub fn participant_ids(&self) -> Vec<UserId> {
        self.participants.iter().map(|p| p.id.clone()).collect()
    }
}
