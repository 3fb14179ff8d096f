//! Integration tests for the room store: membership churn, frame handling,
//! and the recording list.

use polyroom_protocol::{
    ParticipantInfo, Recording, RecordingId, RoomCode, ServerEvent, StreamKind,
    Translation, UserId,
};
use polyroom_state::{Participant, RoomStore, StateDelta};

// =========================================================================
// Helpers
// =========================================================================

fn uid(id: &str) -> UserId {
    UserId::new(id)
}

fn info(id: &str, name: &str, language: &str) -> ParticipantInfo {
    ParticipantInfo {
        id: uid(id),
        name: name.into(),
        language: language.into(),
        has_active_snapshot_stream: false,
        has_active_secondary_stream: false,
    }
}

/// A store for u1/Alice/Spanish in ABC123 that has applied `ack_users`.
fn joined(ack_users: Vec<ParticipantInfo>) -> RoomStore {
    let mut store = RoomStore::new(
        RoomCode::new("ABC123"),
        Participant::new(uid("u1"), "Alice", "Spanish"),
    );
    store.apply(ServerEvent::JoinedRoom {
        room_code: RoomCode::new("ABC123"),
        user_id: uid("u1"),
        users: ack_users,
    });
    store
}

fn peer_joined(id: &str) -> ServerEvent {
    ServerEvent::PeerJoined {
        user_id: uid(id),
        name: format!("name-{id}"),
        language: "French".into(),
    }
}

fn peer_left(id: &str) -> ServerEvent {
    ServerEvent::PeerLeft { user_id: uid(id) }
}

fn secondary(id: &str, frame: &str) -> ServerEvent {
    ServerEvent::SecondarySnapshot {
        user_id: uid(id),
        frame: frame.into(),
    }
}

fn stop(id: &str) -> ServerEvent {
    ServerEvent::SecondaryStreamStopped { user_id: uid(id) }
}

// =========================================================================
// Membership
// =========================================================================

#[test]
fn test_join_ack_with_self_yields_single_participant() {
    let store = joined(vec![info("u1", "Alice", "Spanish")]);
    let view = store.snapshot();

    assert_eq!(view.participants.len(), 1);
    let me = view.participant(&uid("u1")).unwrap();
    assert_eq!(me.language, "Spanish");
    assert_eq!(me.name, "Alice");
}

#[test]
fn test_join_ack_replaces_stale_state() {
    let mut store = joined(vec![info("u1", "Alice", "Spanish")]);
    store.apply(peer_joined("u9"));
    store.apply(secondary("u9", "stale"));

    let delta = store.apply(ServerEvent::JoinedRoom {
        room_code: RoomCode::new("ABC123"),
        user_id: uid("u1"),
        users: vec![info("u1", "Alice", "Spanish"), info("u2", "Bob", "French")],
    });

    assert_eq!(delta, StateDelta::MembershipReplaced { participants: 2 });
    let view = store.snapshot();
    assert!(!view.contains(&uid("u9")));
    assert!(view.snapshots.is_empty());
    assert!(view.active_secondary().is_none());
}

#[test]
fn test_peer_joined_then_left_removes_peer() {
    let mut store = joined(vec![]);
    assert_eq!(
        store.apply(peer_joined("u2")),
        StateDelta::ParticipantJoined(uid("u2"))
    );
    assert_eq!(
        store.apply(peer_left("u2")),
        StateDelta::ParticipantLeft(uid("u2"))
    );
    assert!(!store.snapshot().contains(&uid("u2")));
}

#[test]
fn test_duplicate_peer_joined_is_unchanged() {
    let mut store = joined(vec![]);
    store.apply(peer_joined("u2"));
    assert!(store.apply(peer_joined("u2")).is_unchanged());
    assert_eq!(store.participant_count(), 2);
}

#[test]
fn test_peer_joined_for_known_id_updates_fields() {
    let mut store = joined(vec![info("u2", "Bob", "French")]);
    let delta = store.apply(ServerEvent::PeerJoined {
        user_id: uid("u2"),
        name: "Bobby".into(),
        language: "German".into(),
    });

    assert_eq!(delta, StateDelta::ParticipantUpdated(uid("u2")));
    let view = store.snapshot();
    let bob = view.participant(&uid("u2")).unwrap();
    assert_eq!(bob.name, "Bobby");
    assert_eq!(bob.language, "German");
    assert_eq!(view.participants.len(), 2);
}

#[test]
fn test_peer_left_for_unknown_id_is_noop() {
    let mut store = joined(vec![]);
    let before = store.snapshot();
    assert!(store.apply(peer_left("ghost")).is_unchanged());
    assert_eq!(store.snapshot(), before);
}

#[test]
fn test_peer_left_naming_local_user_is_ignored() {
    let mut store = joined(vec![]);
    assert!(store.apply(peer_left("u1")).is_unchanged());
    assert!(store.snapshot().contains(&uid("u1")));
}

#[test]
fn test_membership_replay_matches_last_event_per_id() {
    // (id, joined?) in delivery order, duplicates included.
    let script = [
        ("u2", true),
        ("u3", true),
        ("u2", true),
        ("u2", false),
        ("u4", false),
        ("u3", false),
        ("u3", true),
        ("u5", true),
        ("u5", false),
        ("u5", false),
        ("u4", true),
    ];

    let mut store = joined(vec![]);
    for (id, join) in script {
        if join {
            store.apply(peer_joined(id));
        } else {
            store.apply(peer_left(id));
        }
    }

    let mut expected: Vec<&str> = Vec::new();
    for (id, _) in script {
        let last = script.iter().rev().find(|(i, _)| *i == id).unwrap();
        if last.1 && !expected.contains(&id) {
            expected.push(id);
        }
    }

    let view = store.snapshot();
    let mut actual: Vec<String> = view
        .participant_ids()
        .into_iter()
        .filter(|id| id.as_str() != "u1")
        .map(|id| id.as_str().to_owned())
        .collect();
    actual.sort();
    expected.sort();
    assert_eq!(actual, expected);
}

// =========================================================================
// Language
// =========================================================================

#[test]
fn test_language_updated_mutates_only_language() {
    let mut store = joined(vec![info("u2", "Bob", "French")]);
    let before = store.snapshot().participant(&uid("u2")).cloned().unwrap();

    let delta = store.apply(ServerEvent::LanguageUpdated {
        user_id: uid("u2"),
        language: "Korean".into(),
    });

    assert_eq!(
        delta,
        StateDelta::LanguageChanged {
            user_id: uid("u2"),
            language: "Korean".into()
        }
    );
    let after = store.snapshot().participant(&uid("u2")).cloned().unwrap();
    assert_eq!(after.language, "Korean");
    assert_eq!(after.name, before.name);
    assert_eq!(after.has_active_snapshot_stream, before.has_active_snapshot_stream);
    assert_eq!(
        after.has_active_secondary_stream,
        before.has_active_secondary_stream
    );
}

#[test]
fn test_language_updated_for_unknown_id_is_ignored() {
    let mut store = joined(vec![]);
    let delta = store.apply(ServerEvent::LanguageUpdated {
        user_id: uid("ghost"),
        language: "Korean".into(),
    });
    assert!(delta.is_unchanged());
}

// =========================================================================
// Frames
// =========================================================================

#[test]
fn test_second_primary_snapshot_replaces_first() {
    let mut store = joined(vec![]);
    store.apply(ServerEvent::PrimarySnapshot {
        user_id: uid("u1"),
        frame: "frame-1".into(),
    });
    store.apply(ServerEvent::PrimarySnapshot {
        user_id: uid("u1"),
        frame: "frame-2".into(),
    });

    let view = store.snapshot();
    let snap = view.snapshot(&uid("u1"), StreamKind::Primary).unwrap();
    assert_eq!(&*snap.frame, "frame-2");
    assert_eq!(view.snapshots.len(), 1);
    assert!(view.local_participant().unwrap().has_active_snapshot_stream);
}

#[test]
fn test_same_snapshot_twice_equals_once() {
    let mut once = joined(vec![info("u2", "Bob", "French")]);
    let mut twice = joined(vec![info("u2", "Bob", "French")]);
    let event = ServerEvent::PrimarySnapshot {
        user_id: uid("u2"),
        frame: "data:image/jpeg;base64,AAAA".into(),
    };

    once.apply(event.clone());
    twice.apply(event.clone());
    assert!(twice.apply(event).is_unchanged());

    assert_eq!(once.snapshot(), twice.snapshot());
}

#[test]
fn test_frame_for_unknown_participant_is_dropped() {
    let mut store = joined(vec![]);
    assert!(store.apply(secondary("ghost", "f")).is_unchanged());
    assert!(store.snapshot().snapshots.is_empty());
}

#[test]
fn test_latest_secondary_claimant_is_active() {
    let mut store = joined(vec![info("u2", "Bob", "French"), info("u3", "Cy", "Hindi")]);
    store.apply(secondary("u2", "a"));
    store.apply(secondary("u3", "b"));
    assert_eq!(store.active_secondary().unwrap().user_id, uid("u3"));

    // A fresh frame from u2 takes the stage back.
    store.apply(secondary("u2", "c"));
    assert_eq!(store.active_secondary().unwrap().user_id, uid("u2"));
}

#[test]
fn test_stop_from_active_holder_clears_active_stream() {
    let mut store = joined(vec![info("u2", "Bob", "French")]);
    store.apply(secondary("u2", "a"));

    let delta = store.apply(stop("u2"));

    assert_eq!(
        delta,
        StateDelta::SecondaryStreamStopped {
            user_id: uid("u2"),
            was_active: true
        }
    );
    let view = store.snapshot();
    assert!(view.active_secondary().is_none());
    assert!(!view.participant(&uid("u2")).unwrap().has_active_secondary_stream);
}

#[test]
fn test_stop_from_non_holder_keeps_active_stream() {
    let mut store = joined(vec![info("u2", "Bob", "French"), info("u3", "Cy", "Hindi")]);
    store.apply(secondary("u2", "a"));
    store.apply(secondary("u3", "b"));

    let delta = store.apply(stop("u2"));

    assert_eq!(
        delta,
        StateDelta::SecondaryStreamStopped {
            user_id: uid("u2"),
            was_active: false
        }
    );
    assert_eq!(store.active_secondary().unwrap().user_id, uid("u3"));
}

#[test]
fn test_stop_without_stream_is_unchanged() {
    let mut store = joined(vec![info("u2", "Bob", "French")]);
    assert!(store.apply(stop("u2")).is_unchanged());
}

#[test]
fn test_peer_left_drops_their_frames() {
    let mut store = joined(vec![info("u2", "Bob", "French")]);
    store.apply(ServerEvent::PrimarySnapshot {
        user_id: uid("u2"),
        frame: "p".into(),
    });
    store.apply(secondary("u2", "s"));

    store.apply(peer_left("u2"));

    let view = store.snapshot();
    assert!(view.snapshots.is_empty());
    assert!(view.active_secondary().is_none());
}

// =========================================================================
// Translations and recordings
// =========================================================================

fn translation(user: &str, translated: &str) -> Translation {
    Translation {
        user_id: uid(user),
        original: "hello".into(),
        translated: translated.into(),
        source_lang: "en".into(),
        target_lang: "Spanish".into(),
        reverse_translation: None,
    }
}

#[test]
fn test_translation_keeps_only_latest() {
    let mut store = joined(vec![info("u2", "Bob", "French")]);
    store.apply(ServerEvent::TranslationResult(translation("u2", "hola")));
    store.apply(ServerEvent::TranslationResult(translation("u2", "buenas")));

    let latest = store.snapshot().latest_translation.unwrap();
    assert_eq!(latest.translated, "buenas");
}

#[test]
fn test_repeated_translation_is_unchanged() {
    let mut store = joined(vec![]);
    let event = ServerEvent::TranslationResult(translation("u1", "hola"));
    assert_eq!(store.apply(event.clone()), StateDelta::TranslationUpdated);
    assert!(store.apply(event).is_unchanged());
}

fn saved(id: i64) -> ServerEvent {
    ServerEvent::RecordingSaved {
        recording_id: RecordingId(id),
        original: format!("original {id}"),
        translated: format!("translated {id}"),
        target_language: "German".into(),
    }
}

#[test]
fn test_recording_saved_prepends_and_dedupes() {
    let mut store = joined(vec![]);
    store.apply(saved(1));
    store.apply(saved(2));
    assert!(store.apply(saved(1)).is_unchanged());

    let recordings = store.snapshot().recordings;
    let ids: Vec<i64> = recordings.iter().map(|r| r.id.0).collect();
    assert_eq!(ids, vec![2, 1]);
    assert!(recordings[0].created_at.is_some());
}

#[test]
fn test_recordings_list_replaces_and_dedupes() {
    let mut store = joined(vec![]);
    store.apply(saved(1));

    let row = |id: i64| Recording {
        id: RecordingId(id),
        original_text: Some("o".into()),
        translated_text: Some("t".into()),
        target_language: "French".into(),
        created_at: None,
    };
    let delta = store.apply(ServerEvent::RecordingsList {
        recordings: vec![row(5), row(4), row(5)],
    });

    assert_eq!(delta, StateDelta::RecordingsUpdated);
    let ids: Vec<i64> = store.snapshot().recordings.iter().map(|r| r.id.0).collect();
    assert_eq!(ids, vec![5, 4]);
}

#[test]
fn test_recording_translated_updates_matching_row() {
    let mut store = joined(vec![]);
    store.apply(saved(3));

    let delta = store.apply(ServerEvent::RecordingTranslated {
        recording_id: RecordingId(3),
        target_language: "Italian".into(),
        translated: Some("ciao".into()),
    });

    assert_eq!(delta, StateDelta::RecordingsUpdated);
    let recording = store.snapshot().recordings.remove(0);
    assert_eq!(recording.target_language, "Italian");
    assert_eq!(recording.translated_text.as_deref(), Some("ciao"));
    assert_eq!(recording.original_text.as_deref(), Some("original 3"));
}

#[test]
fn test_recording_translated_without_text_is_rejected() {
    let mut store = joined(vec![]);
    store.apply(saved(3));
    let before = store.snapshot();

    let delta = store.apply(ServerEvent::RecordingTranslated {
        recording_id: RecordingId(3),
        target_language: "Italian".into(),
        translated: None,
    });

    assert_eq!(
        delta,
        StateDelta::Rejected {
            message: "translation of recording rec-3 failed".into()
        }
    );
    assert_eq!(store.snapshot(), before);
}

// =========================================================================
// Rejections
// =========================================================================

#[test]
fn test_rejections_leave_state_untouched() {
    let mut store = joined(vec![info("u2", "Bob", "French")]);
    store.apply(saved(1));
    let before = store.snapshot();

    let rejections = [
        ServerEvent::RecordingError {
            message: "No text to translate".into(),
        },
        ServerEvent::Error {
            message: "boom".into(),
        },
        ServerEvent::RoomFull {
            room_code: RoomCode::new("ABC123"),
        },
    ];
    for event in rejections {
        assert!(matches!(store.apply(event), StateDelta::Rejected { .. }));
    }

    assert_eq!(store.snapshot(), before);
}

#[test]
fn test_recording_error_message_forwarded_verbatim() {
    let mut store = joined(vec![]);
    let delta = store.apply(ServerEvent::RecordingError {
        message: "Failed to save recording".into(),
    });
    assert_eq!(
        delta,
        StateDelta::Rejected {
            message: "Failed to save recording".into()
        }
    );
}
