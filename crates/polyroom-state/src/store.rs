//! The room store reducer.
//!
//! One exhaustive `match` over [`ServerEvent`] decides how each event
//! changes the room. The rules:
//!
//! - A join acknowledgment replaces everything in one step. The local
//!   participant is always present afterwards.
//! - Membership events are idempotent. A join for a known id updates it,
//!   a leave for an unknown id does nothing, a leave naming the local
//!   participant is ignored.
//! - Update events (language, frames, stream stops, translations) for ids
//!   not in the room are dropped.
//! - Frames are last-write-wins. Re-delivering the frame already stored is
//!   a no-op.
//! - Rejections are reported and never touch state.

use std::collections::HashMap;
use std::sync::Arc;

use polyroom_protocol::{
    ParticipantInfo, Recording, RecordingId, RoomCode, ServerEvent, StreamKind,
    Translation, UserId,
};

use crate::snapshot::latest_secondary;
use crate::{Participant, RoomSnapshot, Snapshot, StateDelta};

/// The authoritative local view of one room.
///
/// Not `Sync`-shared: exactly one task owns the store and applies events in
/// arrival order. Everyone else reads through [`RoomStore::snapshot`].
#[derive(Debug)]
pub struct RoomStore {
    room_code: RoomCode,
    local: Participant,
    participants: Vec<Participant>,
    snapshots: HashMap<(UserId, StreamKind), Snapshot>,
    next_seq: u64,
    latest_translation: Option<Translation>,
    recordings: Vec<Recording>,
}

impl RoomStore {
    /// Creates an empty store for `local` joining `room_code`.
    ///
    /// The local participant is not listed until the join is acknowledged.
    pub fn new(room_code: RoomCode, local: Participant) -> Self {
        Self {
            room_code,
            local,
            participants: Vec::new(),
            snapshots: HashMap::new(),
            next_seq: 0,
            latest_translation: None,
            recordings: Vec::new(),
        }
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    pub fn local_user(&self) -> &UserId {
        &self.local.id
    }

    pub fn participant(&self, id: &UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// The secondary stream currently surfaced, if any.
    pub fn active_secondary(&self) -> Option<&Snapshot> {
        latest_secondary(self.snapshots.values())
    }

    /// Returns an owned copy of the current state.
    pub fn snapshot(&self) -> RoomSnapshot {
        let mut snapshots: Vec<Snapshot> =
            self.snapshots.values().cloned().collect();
        snapshots.sort_by_key(|s| s.seq);

        RoomSnapshot {
            room_code: self.room_code.clone(),
            local_user: self.local.id.clone(),
            participants: self.participants.clone(),
            snapshots,
            latest_translation: self.latest_translation.clone(),
            recordings: self.recordings.clone(),
        }
    }

    /// Folds one relay event into the store.
    ///
    /// Total: every event yields a delta, and no event can fail.
    pub fn apply(&mut self, event: ServerEvent) -> StateDelta {
        match event {
            ServerEvent::JoinedRoom {
                room_code, users, ..
            } => self.replace_membership(room_code, users),

            ServerEvent::PeerJoined {
                user_id,
                name,
                language,
            } => self.upsert_participant(user_id, name, language),

            ServerEvent::PeerLeft { user_id } => self.remove_participant(user_id),

            ServerEvent::LanguageUpdated { user_id, language } => {
                self.change_language(user_id, language)
            }

            ServerEvent::PrimarySnapshot { user_id, frame } => {
                self.store_frame(user_id, StreamKind::Primary, frame)
            }

            ServerEvent::SecondarySnapshot { user_id, frame } => {
                self.store_frame(user_id, StreamKind::Secondary, frame)
            }

            ServerEvent::SecondaryStreamStopped { user_id } => {
                self.stop_secondary(user_id)
            }

            ServerEvent::TranslationResult(translation) => {
                self.store_translation(translation)
            }

            ServerEvent::RecordingSaved {
                recording_id,
                original,
                translated,
                target_language,
            } => self.add_recording(Recording {
                id: recording_id,
                original_text: Some(original),
                translated_text: Some(translated),
                target_language,
                created_at: Some(chrono::Utc::now().to_rfc3339()),
            }),

            ServerEvent::RecordingsList { recordings } => {
                self.replace_recordings(recordings)
            }

            ServerEvent::RecordingTranslated {
                recording_id,
                target_language,
                translated,
            } => self.retranslate_recording(
                recording_id,
                target_language,
                translated,
            ),

            ServerEvent::RecordingError { message }
            | ServerEvent::Error { message } => self.reject(message),

            ServerEvent::RoomFull { room_code } => {
                self.reject(format!("room {room_code} is full"))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    fn replace_membership(
        &mut self,
        room_code: RoomCode,
        users: Vec<ParticipantInfo>,
    ) -> StateDelta {
        let mut participants: Vec<Participant> = Vec::with_capacity(users.len() + 1);
        for info in users {
            let incoming = Participant::from(info);
            match participants.iter_mut().find(|p| p.id == incoming.id) {
                Some(existing) => *existing = incoming,
                None => participants.push(incoming),
            }
        }
        if !participants.iter().any(|p| p.id == self.local.id) {
            participants.push(self.local.clone());
        }

        self.room_code = room_code;
        self.participants = participants;
        self.snapshots.clear();
        self.latest_translation = None;
        self.recordings.clear();

        tracing::info!(
            room = %self.room_code,
            participants = self.participants.len(),
            "room membership replaced"
        );
        StateDelta::MembershipReplaced {
            participants: self.participants.len(),
        }
    }

    fn upsert_participant(
        &mut self,
        user_id: UserId,
        name: String,
        language: String,
    ) -> StateDelta {
        if let Some(existing) = self.participant_mut(&user_id) {
            if existing.name == name && existing.language == language {
                return StateDelta::Unchanged;
            }
            existing.name = name;
            existing.language = language;
            return StateDelta::ParticipantUpdated(user_id);
        }

        tracing::info!(room = %self.room_code, user = %user_id, "participant joined");
        self.participants
            .push(Participant::new(user_id.clone(), name, language));
        StateDelta::ParticipantJoined(user_id)
    }

    fn remove_participant(&mut self, user_id: UserId) -> StateDelta {
        if user_id == self.local.id {
            tracing::debug!(user = %user_id, "ignoring leave for local participant");
            return StateDelta::Unchanged;
        }
        let Some(index) = self.participants.iter().position(|p| p.id == user_id)
        else {
            return StateDelta::Unchanged;
        };

        self.participants.remove(index);
        self.snapshots
            .remove(&(user_id.clone(), StreamKind::Primary));
        self.snapshots
            .remove(&(user_id.clone(), StreamKind::Secondary));

        tracing::info!(room = %self.room_code, user = %user_id, "participant left");
        StateDelta::ParticipantLeft(user_id)
    }

    fn change_language(&mut self, user_id: UserId, language: String) -> StateDelta {
        let Some(participant) = self.participant_mut(&user_id) else {
            tracing::debug!(user = %user_id, "language update for unknown participant");
            return StateDelta::Unchanged;
        };
        if participant.language == language {
            return StateDelta::Unchanged;
        }
        participant.language.clone_from(&language);
        StateDelta::LanguageChanged { user_id, language }
    }

    // -----------------------------------------------------------------------
    // Frames
    // -----------------------------------------------------------------------

    fn store_frame(
        &mut self,
        user_id: UserId,
        kind: StreamKind,
        frame: String,
    ) -> StateDelta {
        let key = (user_id.clone(), kind);
        if self
            .snapshots
            .get(&key)
            .is_some_and(|s| *s.frame == *frame)
        {
            return StateDelta::Unchanged;
        }

        let Some(participant) = self.participant_mut(&user_id) else {
            tracing::trace!(user = %user_id, %kind, "frame for unknown participant");
            return StateDelta::Unchanged;
        };
        participant.set_streaming(kind, true);

        self.next_seq += 1;
        self.snapshots.insert(
            key,
            Snapshot {
                user_id: user_id.clone(),
                kind,
                frame: Arc::from(frame),
                seq: self.next_seq,
            },
        );
        StateDelta::SnapshotUpdated { user_id, kind }
    }

    fn stop_secondary(&mut self, user_id: UserId) -> StateDelta {
        let was_active = self
            .active_secondary()
            .is_some_and(|s| s.user_id == user_id);

        let Some(participant) = self.participant_mut(&user_id) else {
            return StateDelta::Unchanged;
        };
        let was_streaming = participant.has_active_secondary_stream;
        participant.set_streaming(StreamKind::Secondary, false);

        let had_frame = self
            .snapshots
            .remove(&(user_id.clone(), StreamKind::Secondary))
            .is_some();
        if !had_frame && !was_streaming {
            return StateDelta::Unchanged;
        }

        tracing::debug!(user = %user_id, was_active, "secondary stream stopped");
        StateDelta::SecondaryStreamStopped {
            user_id,
            was_active,
        }
    }

    // -----------------------------------------------------------------------
    // Translations and recordings
    // -----------------------------------------------------------------------

    fn store_translation(&mut self, translation: Translation) -> StateDelta {
        if self.participant(&translation.user_id).is_none() {
            tracing::debug!(
                user = %translation.user_id,
                "translation for unknown participant"
            );
            return StateDelta::Unchanged;
        }
        if self.latest_translation.as_ref() == Some(&translation) {
            return StateDelta::Unchanged;
        }
        self.latest_translation = Some(translation);
        StateDelta::TranslationUpdated
    }

    fn add_recording(&mut self, recording: Recording) -> StateDelta {
        if self.recordings.iter().any(|r| r.id == recording.id) {
            return StateDelta::Unchanged;
        }
        tracing::info!(room = %self.room_code, recording = %recording.id, "recording saved");
        self.recordings.insert(0, recording);
        StateDelta::RecordingsUpdated
    }

    fn replace_recordings(&mut self, recordings: Vec<Recording>) -> StateDelta {
        let mut deduped: Vec<Recording> = Vec::with_capacity(recordings.len());
        for recording in recordings {
            if !deduped.iter().any(|r| r.id == recording.id) {
                deduped.push(recording);
            }
        }
        if deduped == self.recordings {
            return StateDelta::Unchanged;
        }
        self.recordings = deduped;
        StateDelta::RecordingsUpdated
    }

    fn retranslate_recording(
        &mut self,
        id: RecordingId,
        target_language: String,
        translated: Option<String>,
    ) -> StateDelta {
        let Some(translated) = translated else {
            return self.reject(format!("translation of recording {id} failed"));
        };
        let Some(recording) = self.recordings.iter_mut().find(|r| r.id == id)
        else {
            tracing::debug!(recording = %id, "translation for unknown recording");
            return StateDelta::Unchanged;
        };
        if recording.target_language == target_language
            && recording.translated_text.as_deref() == Some(translated.as_str())
        {
            return StateDelta::Unchanged;
        }
        recording.target_language = target_language;
        recording.translated_text = Some(translated);
        StateDelta::RecordingsUpdated
    }

    fn reject(&self, message: String) -> StateDelta {
        tracing::warn!(room = %self.room_code, %message, "relay rejected request");
        StateDelta::Rejected { message }
    }

    fn participant_mut(&mut self, id: &UserId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| &p.id == id)
    }
}
