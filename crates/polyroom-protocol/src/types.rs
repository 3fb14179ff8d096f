//! Core protocol types for the relay's event stream.
//!
//! Every frame on the wire is one named event with a JSON payload:
//!
//! ```text
//! { "event": "peer-joined", "data": { "userId": "u2", "name": "Bob", "language": "French" } }
//! ```
//!
//! [`ClientEvent`] covers what this client sends, [`ServerEvent`] what the
//! relay pushes back. Payload fields are camelCase on the wire. Inbound
//! decoding also accepts the relay's older spellings (`roomId`,
//! `user-joined`, `video-frame`, ...) as aliases.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies a participant for the lifetime of one session.
///
/// Serialized as a plain string (`#[serde(transparent)]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The opaque code naming a room on the relay.
///
/// Codes are case-normalized by convention only; the relay treats them as
/// exact strings, so [`RoomCode::new`] keeps whatever it is given and
/// [`RoomCode::normalized`] is there for callers that want the convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Trims surrounding whitespace and upper-cases the code.
    pub fn normalized(code: &str) -> Self {
        Self(code.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Relay-assigned identifier of a saved recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordingId(pub i64);

impl fmt::Display for RecordingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rec-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Stream kinds
// ---------------------------------------------------------------------------

/// Which of a participant's visual streams a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// The camera stream.
    Primary,
    /// The screen-share stream. Only one is surfaced as active at a time.
    Secondary,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Secondary => f.write_str("secondary"),
        }
    }
}

// ---------------------------------------------------------------------------
// Payload records
// ---------------------------------------------------------------------------

/// One member of the room as listed in a join acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub id: UserId,
    pub name: String,
    pub language: String,
    #[serde(default, alias = "streamActive")]
    pub has_active_snapshot_stream: bool,
    #[serde(default, alias = "screenShareActive")]
    pub has_active_secondary_stream: bool,
}

/// A translated transcript broadcast by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    /// The speaker.
    pub user_id: UserId,
    pub original: String,
    pub translated: String,
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_translation: Option<String>,
}

/// A saved voice recording with its translation.
///
/// Rows from `recordings-list` come straight out of the relay's database and
/// use snake_case keys, hence the aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub id: RecordingId,
    #[serde(default, alias = "original_text")]
    pub original_text: Option<String>,
    #[serde(default, alias = "translated_text")]
    pub translated_text: Option<String>,
    #[serde(alias = "target_language")]
    pub target_language: String,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<String>,
}

// ---------------------------------------------------------------------------
// ClientEvent: client → relay
// ---------------------------------------------------------------------------

/// Events this client sends to the relay.
///
/// Adjacently tagged: the variant name (kebab-case) goes in `"event"` and
/// the fields (camelCase) in `"data"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Announce this participant. Sent exactly once per session.
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_code: RoomCode,
        user_id: UserId,
        name: String,
        language: String,
    },

    /// Announce an explicit departure.
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_code: RoomCode, user_id: UserId },

    /// The local participant changed their language after joining.
    #[serde(rename_all = "camelCase")]
    UpdateLanguage {
        room_code: RoomCode,
        user_id: UserId,
        language: String,
    },

    /// One camera frame, as a data URL.
    #[serde(rename_all = "camelCase")]
    PrimarySnapshot {
        room_code: RoomCode,
        user_id: UserId,
        frame: String,
    },

    /// One screen-share frame, as a data URL.
    #[serde(rename_all = "camelCase")]
    SecondarySnapshot {
        room_code: RoomCode,
        user_id: UserId,
        frame: String,
    },

    /// The local screen share ended.
    #[serde(rename_all = "camelCase")]
    SecondaryStreamStop { room_code: RoomCode, user_id: UserId },

    /// A finalized speech transcript to be translated by the relay.
    #[serde(rename_all = "camelCase")]
    TranscriptChunk {
        room_code: RoomCode,
        user_id: UserId,
        text: String,
        source_lang: String,
        target_lang: String,
    },

    /// Persist a recording. `audio_blob` is standard base64 without a
    /// data-URL prefix; `duration` is in seconds.
    #[serde(rename_all = "camelCase")]
    SaveRecording {
        room_code: RoomCode,
        user_id: UserId,
        audio_blob: String,
        original_text: String,
        target_language: String,
        duration: f64,
    },

    /// Ask for the room's saved recordings.
    #[serde(rename_all = "camelCase")]
    GetRecordings { room_code: RoomCode },

    /// Ask for an existing recording in another language.
    #[serde(rename_all = "camelCase")]
    TranslateRecording {
        recording_id: RecordingId,
        original_text: String,
        target_language: String,
    },
}

impl ClientEvent {
    /// Builds the snapshot event matching `kind`.
    pub fn snapshot(
        kind: StreamKind,
        room_code: RoomCode,
        user_id: UserId,
        frame: String,
    ) -> Self {
        match kind {
            StreamKind::Primary => Self::PrimarySnapshot {
                room_code,
                user_id,
                frame,
            },
            StreamKind::Secondary => Self::SecondarySnapshot {
                room_code,
                user_id,
                frame,
            },
        }
    }

    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join-room",
            Self::LeaveRoom { .. } => "leave-room",
            Self::UpdateLanguage { .. } => "update-language",
            Self::PrimarySnapshot { .. } => "primary-snapshot",
            Self::SecondarySnapshot { .. } => "secondary-snapshot",
            Self::SecondaryStreamStop { .. } => "secondary-stream-stop",
            Self::TranscriptChunk { .. } => "transcript-chunk",
            Self::SaveRecording { .. } => "save-recording",
            Self::GetRecordings { .. } => "get-recordings",
            Self::TranslateRecording { .. } => "translate-recording",
        }
    }
}

// ---------------------------------------------------------------------------
// ServerEvent: relay → client
// ---------------------------------------------------------------------------

/// Events the relay pushes to this client.
///
/// This is the single inbound sum type the room store folds over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Join acknowledgment carrying the full current membership.
    #[serde(rename_all = "camelCase")]
    JoinedRoom {
        #[serde(alias = "roomId")]
        room_code: RoomCode,
        user_id: UserId,
        #[serde(default)]
        users: Vec<ParticipantInfo>,
    },

    #[serde(rename_all = "camelCase", alias = "user-joined")]
    PeerJoined {
        user_id: UserId,
        name: String,
        language: String,
    },

    #[serde(rename_all = "camelCase", alias = "user-left")]
    PeerLeft { user_id: UserId },

    #[serde(rename_all = "camelCase")]
    LanguageUpdated { user_id: UserId, language: String },

    #[serde(rename_all = "camelCase", alias = "video-frame")]
    PrimarySnapshot { user_id: UserId, frame: String },

    #[serde(rename_all = "camelCase", alias = "screen-frame")]
    SecondarySnapshot { user_id: UserId, frame: String },

    #[serde(rename_all = "camelCase", alias = "screen-share-stopped")]
    SecondaryStreamStopped { user_id: UserId },

    TranslationResult(Translation),

    /// Acknowledges this client's `save-recording`.
    #[serde(rename_all = "camelCase")]
    RecordingSaved {
        recording_id: RecordingId,
        original: String,
        translated: String,
        target_language: String,
    },

    /// Answer to `get-recordings`, newest first.
    #[serde(rename_all = "camelCase")]
    RecordingsList {
        #[serde(default)]
        recordings: Vec<Recording>,
    },

    /// Answer to `translate-recording`. `translated` is null when the
    /// translation backend failed.
    #[serde(rename_all = "camelCase")]
    RecordingTranslated {
        recording_id: RecordingId,
        target_language: String,
        #[serde(default)]
        translated: Option<String>,
    },

    /// The relay refused a recording operation.
    RecordingError { message: String },

    /// The relay refused the join because the room is at capacity.
    #[serde(rename_all = "camelCase")]
    RoomFull {
        #[serde(alias = "roomId")]
        room_code: RoomCode,
    },

    /// A generic relay-side failure.
    Error { message: String },
}

impl ServerEvent {
    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinedRoom { .. } => "joined-room",
            Self::PeerJoined { .. } => "peer-joined",
            Self::PeerLeft { .. } => "peer-left",
            Self::LanguageUpdated { .. } => "language-updated",
            Self::PrimarySnapshot { .. } => "primary-snapshot",
            Self::SecondarySnapshot { .. } => "secondary-snapshot",
            Self::SecondaryStreamStopped { .. } => "secondary-stream-stopped",
            Self::TranslationResult(_) => "translation-result",
            Self::RecordingSaved { .. } => "recording-saved",
            Self::RecordingsList { .. } => "recordings-list",
            Self::RecordingTranslated { .. } => "recording-translated",
            Self::RecordingError { .. } => "recording-error",
            Self::RoomFull { .. } => "room-full",
            Self::Error { .. } => "error",
        }
    }

    /// The user-facing message if this event is a relay rejection.
    pub fn rejection(&self) -> Option<String> {
        match self {
            Self::RecordingError { message } | Self::Error { message } => {
                Some(message.clone())
            }
            Self::RoomFull { room_code } => {
                Some(format!("room {room_code} is full"))
            }
            _ => None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
