//! Participant entries.

use polyroom_protocol::{ParticipantInfo, StreamKind, UserId};

/// One member of the room as the store sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: UserId,
    pub name: String,
    pub language: String,
    pub has_active_snapshot_stream: bool,
    pub has_active_secondary_stream: bool,
}

impl Participant {
    /// A participant with no active streams.
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            language: language.into(),
            has_active_snapshot_stream: false,
            has_active_secondary_stream: false,
        }
    }

    /// Returns the stream flag for `kind`.
    pub fn is_streaming(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Primary => self.has_active_snapshot_stream,
            StreamKind::Secondary => self.has_active_secondary_stream,
        }
    }

    pub(crate) fn set_streaming(&mut self, kind: StreamKind, active: bool) {
        match kind {
            StreamKind::Primary => self.has_active_snapshot_stream = active,
            StreamKind::Secondary => self.has_active_secondary_stream = active,
        }
    }
}

impl From<ParticipantInfo> for Participant {
    fn from(info: ParticipantInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            language: info.language,
            has_active_snapshot_stream: info.has_active_snapshot_stream,
            has_active_secondary_stream: info.has_active_secondary_stream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_info_keeps_stream_flags() {
        let info = ParticipantInfo {
            id: UserId::new("u2"),
            name: "Bob".into(),
            language: "French".into(),
            has_active_snapshot_stream: true,
            has_active_secondary_stream: false,
        };
        let p = Participant::from(info);
        assert!(p.is_streaming(StreamKind::Primary));
        assert!(!p.is_streaming(StreamKind::Secondary));
    }

    #[test]
    fn test_set_streaming_touches_one_flag() {
        let mut p = Participant::new(UserId::new("u1"), "Alice", "Spanish");
        p.set_streaming(StreamKind::Secondary, true);
        assert!(p.has_active_secondary_stream);
        assert!(!p.has_active_snapshot_stream);
    }
}
