//! The result of folding one event into the store.

use polyroom_protocol::{StreamKind, UserId};

/// What a single [`RoomStore::apply`](crate::RoomStore::apply) call changed.
///
/// Every event maps to exactly one delta. Events that were ignored or that
/// repeat what the store already holds map to [`StateDelta::Unchanged`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateDelta {
    /// A join acknowledgment replaced the whole room view.
    MembershipReplaced { participants: usize },

    ParticipantJoined(UserId),

    /// A known participant re-announced with a new name or language.
    ParticipantUpdated(UserId),

    ParticipantLeft(UserId),

    LanguageChanged { user_id: UserId, language: String },

    SnapshotUpdated { user_id: UserId, kind: StreamKind },

    /// A participant's secondary stream ended. `was_active` is true when it
    /// was the stream being surfaced as active.
    SecondaryStreamStopped { user_id: UserId, was_active: bool },

    TranslationUpdated,

    RecordingsUpdated,

    /// The relay refused an operation. The store is untouched.
    Rejected { message: String },

    Unchanged,
}

impl StateDelta {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Returns `true` if this delta altered who is in the room.
    pub fn is_membership(&self) -> bool {
        matches!(
            self,
            Self::MembershipReplaced { .. }
                | Self::ParticipantJoined(_)
                | Self::ParticipantLeft(_)
        )
    }
}
