use std::sync::Arc;

use chrono::{TimeZone, Utc};

use drill_core::{CompactState, SessionSnapshot, Side, WordKey, WordSnapshot};
use storage::{BlobStore, LessonRef, MemoryBlobStore, SavedSession, SessionStore};

fn snapshot() -> SessionSnapshot {
    SessionSnapshot {
        counter: 9,
        bins: 4,
        current_word: Some(2),
        correct_answers: 5,
        bin_count: vec![1, 2, 0, 0],
        words: vec![
            WordSnapshot {
                key: WordKey::new(0, Side::Forward),
                bin: 1,
                due_counter: -1,
                quiz_count: 3,
                remaining_reps: 1,
            },
            WordSnapshot {
                key: WordKey::new(0, Side::Reverse),
                bin: 0,
                due_counter: 11,
                quiz_count: 2,
                remaining_reps: 2,
            },
            WordSnapshot {
                key: WordKey::new(1, Side::Forward),
                bin: 1,
                due_counter: -1,
                quiz_count: 3,
                remaining_reps: 1,
            },
        ],
    }
}

#[test]
fn record_with_state_survives_the_store() {
    let blob = Arc::new(MemoryBlobStore::new());
    let sessions = SessionStore::new(Arc::clone(&blob) as Arc<dyn BlobStore>);

    let original = snapshot();
    let record = SavedSession {
        lesson: LessonRef {
            language: "nl".to_owned(),
            path: "lessons/animals.txt".to_owned(),
            name: "Animals".to_owned(),
        },
        fingerprint: "5ca1ab1e".to_owned(),
        state: Some(CompactState::encode(&original)),
        saved_at: Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap(),
    };

    sessions.save(&record).unwrap();
    let loaded = sessions.load().unwrap().expect("record present");
    assert_eq!(loaded, record);

    let restored = loaded.state.unwrap().decode().unwrap();
    assert_eq!(restored, original);
}

#[test]
fn state_is_stored_as_a_positional_array() {
    let blob = Arc::new(MemoryBlobStore::new());
    let sessions = SessionStore::new(Arc::clone(&blob) as Arc<dyn BlobStore>);

    let record = SavedSession {
        lesson: LessonRef {
            language: "nl".to_owned(),
            path: "lessons/animals.txt".to_owned(),
            name: "Animals".to_owned(),
        },
        fingerprint: "5ca1ab1e".to_owned(),
        state: Some(CompactState::encode(&snapshot())),
        saved_at: Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap(),
    };
    sessions.save(&record).unwrap();

    // the envelope is named-field JSON but the state inside stays compact
    let raw = blob.load(storage::DEFAULT_SESSION_KEY).unwrap().unwrap();
    assert!(raw.contains("\"state\":[3,9,4,2,5,[1,2,0,0],[["));
    assert!(!raw.contains("\"due_counter\""));
}
