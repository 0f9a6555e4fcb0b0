use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use services::{DrillRunner, LessonService, MemoryLessonSource};
use storage::{BlobStore, LessonRef, MemoryBlobStore};

const LESSON_TEXT: &str = "\
#question1=Wat is \"\"
#question2=What is \"\"
hond, dog
kat, cat
";

fn lesson_ref() -> LessonRef {
    LessonRef {
        language: "nl".to_owned(),
        path: "animals.txt".to_owned(),
        name: "Animals".to_owned(),
    }
}

fn service(blob: &Arc<MemoryBlobStore>, text: &str) -> LessonService {
    let source = MemoryLessonSource::new().with_lesson("animals.txt", text);
    LessonService::new(Arc::new(source), Arc::clone(blob) as Arc<dyn BlobStore>)
}

#[tokio::test]
async fn drill_to_completion_fires_hook_once() {
    let blob = Arc::new(MemoryBlobStore::new());
    let service = service(&blob, LESSON_TEXT);

    let opened = service.open(&lesson_ref()).await.unwrap();
    assert!(!opened.resumed);
    let mut session = opened.session;
    assert_eq!(session.word_count(), 4);

    let completions = Arc::new(AtomicUsize::new(0));
    let completions_inner = Arc::clone(&completions);
    let mut runner = DrillRunner::new().with_completion_hook(Box::new(move || {
        completions_inner.fetch_add(1, Ordering::SeqCst);
    }));

    let mut guard = 0;
    loop {
        let answer = session.correct_answer().unwrap().to_owned();
        let outcome = runner.answer(&mut session, &answer).unwrap();
        assert!(outcome.correct);
        if outcome.finished {
            break;
        }
        assert!(runner.advance(&mut session));

        guard += 1;
        assert!(guard < 500, "drill did not converge");
    }

    assert!(session.is_finished());
    assert!(!runner.advance(&mut session));
    assert_eq!(completions.load(Ordering::SeqCst), 1);

    // answering after completion must not fire the hook again
    let _ = runner.answer(&mut session, "anything");
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn saved_progress_resumes_on_reopen() {
    let blob = Arc::new(MemoryBlobStore::new());
    let service = service(&blob, LESSON_TEXT);

    let mut session = service.open(&lesson_ref()).await.unwrap().session;
    for _ in 0..3 {
        let answer = session.correct_answer().unwrap().to_owned();
        session.compare_answer(&answer).unwrap();
        session.next_question();
    }
    service.save(&session, &lesson_ref()).unwrap();

    let reopened = service.open(&lesson_ref()).await.unwrap();
    assert!(reopened.resumed);
    assert_eq!(reopened.session.counter(), session.counter());
    assert_eq!(reopened.session.correct_answers(), session.correct_answers());
    assert_eq!(reopened.session.word_count(), session.word_count());
    assert_eq!(reopened.session.snapshot(), session.snapshot());
}

#[tokio::test]
async fn changed_lesson_invalidates_saved_progress() {
    let blob = Arc::new(MemoryBlobStore::new());
    let service_v1 = service(&blob, LESSON_TEXT);

    let session = service_v1.open(&lesson_ref()).await.unwrap().session;
    service_v1.save(&session, &lesson_ref()).unwrap();

    // same path, reordered lines: fingerprint changes
    let service_v2 = service(&blob, "kat, cat\nhond, dog\n");
    let reopened = service_v2.open(&lesson_ref()).await.unwrap();
    assert!(!reopened.resumed);

    // the stale record was cleared, not kept around
    assert_eq!(blob.load(storage::DEFAULT_SESSION_KEY).unwrap(), None);
}

#[tokio::test]
async fn blank_line_edits_keep_saved_progress_valid() {
    let blob = Arc::new(MemoryBlobStore::new());
    let service_v1 = service(&blob, LESSON_TEXT);

    let mut session = service_v1.open(&lesson_ref()).await.unwrap().session;
    let answer = session.correct_answer().unwrap().to_owned();
    session.compare_answer(&answer).unwrap();
    service_v1.save(&session, &lesson_ref()).unwrap();

    let padded = LESSON_TEXT.replace("hond, dog\n", "hond, dog\n\n\n");
    let service_v2 = service(&blob, &padded);
    let reopened = service_v2.open(&lesson_ref()).await.unwrap();
    assert!(reopened.resumed);
    assert_eq!(reopened.session.counter(), session.counter());
}

#[tokio::test]
async fn oversized_state_degrades_to_fresh_session() {
    let blob = Arc::new(MemoryBlobStore::new());
    let service = service(&blob, LESSON_TEXT).with_max_state_kb(0);

    let mut session = service.open(&lesson_ref()).await.unwrap().session;
    let answer = session.correct_answer().unwrap().to_owned();
    session.compare_answer(&answer).unwrap();
    service.save(&session, &lesson_ref()).unwrap();

    // the record exists but carries no state, so nothing resumes
    let reopened = service.open(&lesson_ref()).await.unwrap();
    assert!(!reopened.resumed);
    assert_eq!(reopened.session.counter(), 1);
}

#[tokio::test]
async fn missing_lesson_is_a_fatal_load_error() {
    let blob = Arc::new(MemoryBlobStore::new());
    let service = service(&blob, LESSON_TEXT);

    let missing = LessonRef {
        language: "nl".to_owned(),
        path: "missing.txt".to_owned(),
        name: "Missing".to_owned(),
    };
    assert!(service.open(&missing).await.is_err());
}
