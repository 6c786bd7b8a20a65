use super::*;
use crate::clock::FixedClock;
use crate::error::BackendError;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn store_on(date: NaiveDate) -> (ProgressStore<MemoryBackend>, FixedClock) {
    let clock = FixedClock::new(date);
    let store = ProgressStore::new(MemoryBackend::new(), Box::new(clock.clone()));
    (store, clock)
}

fn loaded_store(total: u32) -> (ProgressStore<MemoryBackend>, FixedClock) {
    let (mut store, clock) = store_on(day(10));
    store.load(7);
    store.initialize_module("greetings", total);
    (store, clock)
}

#[test]
fn load_creates_and_persists_empty_record() {
    let (mut store, _) = store_on(day(1));
    let progress = store.load(42);
    assert_eq!(progress, &UserProgress::new(42));

    let raw = store.backend().raw("user_progress_42").unwrap();
    let stored: UserProgress = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored, UserProgress::new(42));
}

#[test]
fn load_discards_corrupt_record() {
    let (mut store, _) = store_on(day(1));
    store.backend().insert_raw("user_progress_3", "{not json");

    assert_eq!(store.load(3), &UserProgress::new(3));
    let raw = store.backend().raw("user_progress_3").unwrap();
    assert!(serde_json::from_str::<UserProgress>(&raw).is_ok());
}

#[test]
fn load_migrates_missing_score_and_writes_back() {
    let (mut store, _) = store_on(day(1));
    store.backend().insert_raw(
        "user_progress_5",
        r#"{"userId":5,"modules":{"shopping":{"moduleId":"shopping","totalQuestions":4,
            "answeredQuestions":2,"correctAnswers":1,"lastAccessDate":"2024-05-30","sessions":[]}}}"#,
    );

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    store.subscribe(move |event, _| sink.lock().unwrap().push(event.clone()));

    let progress = store.load(5);
    assert_eq!(progress.modules["shopping"].score, 0);
    assert_eq!(progress.modules["shopping"].answered_questions, 2);

    let raw: Value = serde_json::from_str(&store.backend().raw("user_progress_5").unwrap()).unwrap();
    assert_eq!(raw["modules"]["shopping"]["score"], 0);
    assert_eq!(
        events.lock().unwrap().as_slice(),
        [ProgressEvent::Loaded { user_id: 5, migrated: 1 }]
    );
}

#[test]
fn load_turns_null_score_into_zero() {
    let (mut store, _) = store_on(day(1));
    store.backend().insert_raw(
        "user_progress_6",
        r#"{"userId":6,"modules":{"greetings":{"moduleId":"greetings","totalQuestions":3,
            "answeredQuestions":1,"correctAnswers":1,"score":null,"lastAccessDate":"2024-05-30","sessions":[]}}}"#,
    );

    let progress = store.load(6);
    assert_eq!(progress.modules["greetings"].score, 0);
    assert_eq!(progress.modules["greetings"].answered_questions, 1);

    let raw: Value = serde_json::from_str(&store.backend().raw("user_progress_6").unwrap()).unwrap();
    assert_eq!(raw["modules"]["greetings"]["score"], 0);
}

#[test]
fn load_discards_record_that_breaks_the_schema() {
    let (mut store, _) = store_on(day(1));
    store.backend().insert_raw(
        "user_progress_8",
        r#"{"userId":8,"modules":{"greetings":{"moduleId":"greetings","totalQuestions":3,
            "answeredQuestions":1,"correctAnswers":1,"score":10,"lastAccessDate":"30/05/2024","sessions":[]}}}"#,
    );

    assert_eq!(store.load(8), &UserProgress::new(8));
    let raw = store.backend().raw("user_progress_8").unwrap();
    let stored: UserProgress = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored, UserProgress::new(8));
}

#[test]
fn initialize_creates_once_then_touches_access_date() {
    let (mut store, clock) = loaded_store(3);
    let module = store.module_progress("greetings").unwrap().clone();
    assert_eq!(module, ModuleProgress::new("greetings", 3, day(10)));

    store.record_answer("greetings", true, 10);
    clock.set(day(12));
    assert!(store.initialize_module("greetings", 99));

    let module = store.module_progress("greetings").unwrap();
    assert_eq!(module.last_access_date, day(12));
    assert_eq!(module.total_questions, 3);
    assert_eq!(module.answered_questions, 1);
}

#[test]
fn mutations_before_load_are_noops() {
    let (mut store, _) = store_on(day(1));
    assert!(!store.initialize_module("m", 3));
    assert!(!store.record_answer("m", true, 10));
    assert!(!store.reset_module("m"));
    assert!(store.progress().is_none());
    assert!(store.today_activity().is_empty());
}

#[test]
fn record_answer_on_unknown_module_is_noop() {
    let (mut store, _) = loaded_store(3);
    assert!(!store.record_answer("travel", true, 10));
    assert!(store.module_progress("travel").is_none());
    assert_eq!(store.module_score("travel"), 0);
}

#[test]
fn counts_and_score_follow_answers() {
    let (mut store, _) = loaded_store(10);
    let answers = [true, false, true, true, false];
    for correct in answers {
        store.record_answer("greetings", correct, 10);
    }

    let module = store.module_progress("greetings").unwrap();
    assert_eq!(module.answered_questions, 5);
    assert_eq!(module.correct_answers, 3);
    assert_eq!(module.score, 30);
    assert_eq!(store.module_score("greetings"), 30);
    assert!(module.completed_date.is_none());
}

#[test]
fn custom_points_are_applied() {
    let (mut store, _) = loaded_store(10);
    store.record_answer("greetings", true, 25);
    store.record_answer("greetings", false, 25);
    assert_eq!(store.module_score("greetings"), 25);
}

#[test]
fn completion_tracks_answer_count_not_correctness() {
    let (mut store, _) = loaded_store(3);
    store.record_answer("greetings", true, 10);
    store.record_answer("greetings", true, 10);
    assert!(store.module_progress("greetings").unwrap().completed_date.is_none());
    store.record_answer("greetings", false, 10);

    let module = store.module_progress("greetings").unwrap();
    assert_eq!(module.answered_questions, 3);
    assert_eq!(module.correct_answers, 2);
    assert_eq!(module.score, 20);
    assert_eq!(module.completed_date, Some(day(10)));
}

#[test]
fn completion_date_is_set_once() {
    let (mut store, clock) = loaded_store(1);
    store.record_answer("greetings", true, 10);
    assert_eq!(store.module_progress("greetings").unwrap().completed_date, Some(day(10)));

    clock.set(day(11));
    store.record_answer("greetings", false, 10);
    store.record_answer("greetings", true, 10);

    let module = store.module_progress("greetings").unwrap();
    assert_eq!(module.completed_date, Some(day(10)));
    assert_eq!(module.answered_questions, 3);
}

#[test]
fn same_day_answers_share_one_activity_entry() {
    let (mut store, _) = loaded_store(5);
    store.record_answer("greetings", true, 10);
    store.record_answer("greetings", false, 10);

    let history = store.session_history("greetings");
    assert_eq!(
        history,
        vec![SessionActivity {
            date: day(10),
            questions_answered: 2,
            correct_answers: 1,
            time_spent: None,
        }]
    );
}

#[test]
fn answers_on_different_days_get_separate_entries() {
    let (mut store, clock) = loaded_store(5);
    store.record_answer("greetings", true, 10);
    clock.set(day(11));
    store.record_answer("greetings", true, 10);
    store.record_answer("greetings", true, 10);

    let history = store.session_history("greetings");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].date, day(10));
    assert_eq!(history[1].questions_answered, 2);
}

#[test]
fn time_spent_accumulates_into_today() {
    let (mut store, _) = loaded_store(5);
    assert!(store.record_time_spent("greetings", 30));
    assert!(store.record_time_spent("greetings", 15));
    store.record_answer("greetings", true, 10);

    let today = store.today_activity();
    assert_eq!(today.len(), 1);
    assert_eq!(today[0].activity.time_spent, Some(45));
    assert_eq!(today[0].activity.questions_answered, 1);
    assert!(!store.record_time_spent("unknown", 10));
}

#[test]
fn reset_clears_counters_and_only_todays_entry() {
    let (mut store, clock) = loaded_store(2);
    store.record_answer("greetings", true, 10);
    clock.set(day(11));
    store.record_answer("greetings", true, 10);
    assert!(store.module_progress("greetings").unwrap().is_completed());

    assert!(store.reset_module("greetings"));

    let module = store.module_progress("greetings").unwrap();
    assert_eq!(module.answered_questions, 0);
    assert_eq!(module.correct_answers, 0);
    assert_eq!(module.score, 0);
    assert_eq!(module.completed_date, None);
    assert_eq!(module.last_access_date, day(11));
    assert_eq!(
        module.sessions,
        vec![SessionActivity {
            date: day(10),
            questions_answered: 1,
            correct_answers: 1,
            time_spent: None,
        }]
    );
}

#[test]
fn reset_of_unknown_module_is_noop() {
    let (mut store, _) = loaded_store(2);
    assert!(!store.reset_module("nope"));
}

#[test]
fn completion_can_happen_again_after_reset() {
    let (mut store, clock) = loaded_store(1);
    store.record_answer("greetings", true, 10);
    store.reset_module("greetings");
    clock.set(day(15));
    store.record_answer("greetings", false, 10);
    assert_eq!(store.module_progress("greetings").unwrap().completed_date, Some(day(15)));
}

#[test]
fn activity_views_merge_across_modules() {
    let (mut store, clock) = loaded_store(5);
    store.initialize_module("shopping", 5);
    store.record_answer("greetings", true, 10);
    store.record_answer("shopping", false, 10);
    store.record_answer("shopping", true, 10);
    clock.set(day(12));
    store.record_answer("shopping", true, 10);

    let on_tenth = store.activity_for_date(day(10));
    assert_eq!(on_tenth.len(), 2);
    assert_eq!(on_tenth[0].module_id, "greetings");
    assert_eq!(on_tenth[1].activity.questions_answered, 2);

    let totals = store.activity_by_date();
    assert_eq!(totals.len(), 2);
    assert_eq!(
        totals[&day(10)],
        ActivityTotals {
            questions_answered: 3,
            correct_answers: 2
        }
    );
    assert_eq!(totals[&day(10)].accuracy_percent(), 67);
    assert_eq!(totals[&day(12)].questions_answered, 1);

    assert_eq!(store.today_activity().len(), 1);
    assert!(store.activity_for_date(day(1)).is_empty());
}

#[test]
fn session_history_is_chronological() {
    let (mut store, clock) = loaded_store(9);
    clock.set(day(20));
    store.record_answer("greetings", true, 10);
    clock.set(day(18));
    store.record_answer("greetings", true, 10);

    let dates: Vec<NaiveDate> = store.session_history("greetings").iter().map(|s| s.date).collect();
    assert_eq!(dates, vec![day(18), day(20)]);
    assert!(store.session_history("unknown").is_empty());
}

#[test]
fn every_mutation_is_written_through() {
    let (mut store, _) = loaded_store(3);
    store.record_answer("greetings", true, 10);

    let raw = store.backend().raw("user_progress_7").unwrap();
    let stored: UserProgress = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.modules["greetings"].score, 10);
    assert_eq!(Some(&stored), store.progress());
}

#[test]
fn progress_survives_reload() {
    let (mut store, clock) = loaded_store(3);
    store.record_answer("greetings", true, 10);
    store.record_answer("greetings", false, 10);
    let payload = store.backend().raw("user_progress_7").unwrap();

    let mut reopened = ProgressStore::new(MemoryBackend::new(), Box::new(clock));
    reopened.backend().insert_raw("user_progress_7", &payload);
    reopened.load(7);

    let module = reopened.module_progress("greetings").unwrap();
    assert_eq!(module.answered_questions, 2);
    assert_eq!(module.score, 10);
}

#[test]
fn listeners_see_events_in_order_and_can_unsubscribe() {
    let (mut store, _) = store_on(day(10));
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let id = store.subscribe(move |event, progress| {
        let score = progress
            .and_then(|p| p.modules.get("greetings"))
            .map(|m| m.score);
        sink.lock().unwrap().push((event.clone(), score));
    });

    store.load(1);
    store.initialize_module("greetings", 1);
    store.record_answer("greetings", true, 10);

    {
        let seen = events.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(
            seen[2],
            (
                ProgressEvent::AnswerRecorded {
                    module_id: "greetings".into(),
                    is_correct: true,
                    points: 10
                },
                Some(10)
            )
        );
        assert_eq!(
            seen[3].0,
            ProgressEvent::ModuleCompleted {
                module_id: "greetings".into(),
                date: day(10)
            }
        );
    }

    assert!(store.unsubscribe(id));
    assert!(!store.unsubscribe(id));
    store.reset_module("greetings");
    assert_eq!(events.lock().unwrap().len(), 4);
}

#[test]
fn clear_removes_record_and_unloads() {
    let (mut store, _) = loaded_store(3);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    store.subscribe(move |event, progress| sink.lock().unwrap().push((event.clone(), progress.is_some())));

    store.clear_user_progress(7);

    assert!(store.backend().raw("user_progress_7").is_none());
    assert!(store.progress().is_none());
    assert!(!store.record_answer("greetings", true, 10));
    assert_eq!(
        events.lock().unwrap().as_slice(),
        [(ProgressEvent::Cleared { user_id: 7 }, false)]
    );
}

struct BrokenBackend;

impl ProgressBackend for BrokenBackend {
    fn read(&self, _key: &str) -> Result<Option<String>, BackendError> {
        Err(BackendError::Unavailable("disk gone".into()))
    }

    fn write(&self, key: &str, _payload: &str) -> Result<(), BackendError> {
        Err(BackendError::Write {
            key: key.to_string(),
            reason: "read-only".into(),
        })
    }

    fn remove(&self, _key: &str) -> Result<(), BackendError> {
        Err(BackendError::Unavailable("disk gone".into()))
    }
}

#[test]
fn storage_failures_degrade_to_in_memory_progress() {
    let mut store = ProgressStore::new(BrokenBackend, Box::new(FixedClock::new(day(3))));
    assert_eq!(store.load(9), &UserProgress::new(9));
    assert!(store.initialize_module("greetings", 2));
    assert!(store.record_answer("greetings", true, 10));
    assert_eq!(store.module_score("greetings"), 10);
    store.clear_user_progress(9);
    assert!(store.progress().is_none());
}

/// Memory backend whose reads can be made to fail while writes still work.
struct FlakyBackend {
    inner: MemoryBackend,
    fail_reads: AtomicBool,
}

impl ProgressBackend for FlakyBackend {
    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("database is locked".into()));
        }
        self.inner.read(key)
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), BackendError> {
        self.inner.write(key, payload)
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.inner.remove(key)
    }
}

const SAVED_GREETINGS: &str = r#"{"userId":1,"modules":{"greetings":{"moduleId":"greetings","totalQuestions":5,"answeredQuestions":4,"correctAnswers":4,"score":40,"lastAccessDate":"2024-06-01","sessions":[]}}}"#;

fn flaky_store() -> ProgressStore<FlakyBackend> {
    let backend = FlakyBackend {
        inner: MemoryBackend::new(),
        fail_reads: AtomicBool::new(true),
    };
    backend.inner.insert_raw("user_progress_1", SAVED_GREETINGS);
    ProgressStore::new(backend, Box::new(FixedClock::new(day(3))))
}

#[test]
fn failed_read_leaves_stored_record_untouched() {
    let mut store = flaky_store();

    assert_eq!(store.load(1), &UserProgress::new(1));
    assert!(store.initialize_module("greetings", 5));
    assert!(store.record_answer("greetings", true, 10));
    assert_eq!(store.module_score("greetings"), 10);

    assert_eq!(
        store.backend().inner.raw("user_progress_1").as_deref(),
        Some(SAVED_GREETINGS)
    );
}

#[test]
fn writes_resume_after_a_successful_load() {
    let mut store = flaky_store();
    store.load(1);

    store.backend().fail_reads.store(false, Ordering::SeqCst);
    assert_eq!(store.load(1).modules["greetings"].score, 40);
    assert!(store.record_answer("greetings", true, 10));

    let raw = store.backend().inner.raw("user_progress_1").unwrap();
    let stored: UserProgress = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.modules["greetings"].score, 50);
    assert!(stored.modules["greetings"].is_completed());
}
