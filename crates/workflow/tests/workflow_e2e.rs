//! End-to-end workflow tests over the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use storyday_core::{CalendarSummary, StoryRecord, WireStatus};
use storyday_storage::{
    CanProceedRecord, CompletionAck, CompletionSubmission, MemoryStore, RemainingRequests,
    StorageError, StoreOperation, StoryStore, TodayStatus,
};
use storyday_workflow::{
    CalendarAggregator, ChannelSink, CompletionOutcome, CompletionWorkflow, DayState, RetryPolicy,
    ViewSource, WorkflowError,
};
use time::macros::date;
use time::Date;

const TODAY: Date = date!(2026 - 10 - 19);

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        timeout: Duration::from_millis(200),
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
    }
}

fn workflow_over<S: StoryStore>(
    store: Arc<S>,
) -> (
    CompletionWorkflow<S>,
    tokio::sync::mpsc::UnboundedReceiver<storyday_workflow::StoryCompleted>,
) {
    let (sink, rx) = ChannelSink::new();
    (
        CompletionWorkflow::new(store, Arc::new(sink), "learner", TODAY, fast_retry()),
        rx,
    )
}

// ── Full day ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_day_from_request_to_calendar() {
    let store = Arc::new(MemoryStore::new(TODAY));
    let (mut wf, mut rx) = workflow_over(store.clone());

    assert_eq!(wf.refresh().await.unwrap(), DayState::NoStoryToday);
    wf.request_story().await.unwrap();
    assert_eq!(wf.state(), DayState::StoryInProgress);

    wf.interact("morning", WireStatus::Known).await.unwrap();
    wf.interact("coffee", WireStatus::Known).await.unwrap();
    assert!(!wf.local_gate().allowed);
    assert_eq!(wf.progress().unwrap().progress_percentage, 67);

    wf.interact_raw("window", "PARTIALLY_KNOWN").await.unwrap();
    assert!(wf.check_gate().await.decision.allowed);
    assert_eq!(wf.progress().unwrap().progress_percentage, 83);

    let outcome = wf.complete(3, 30).await.unwrap();
    assert!(matches!(outcome, CompletionOutcome::Completed(_)));
    assert_eq!(wf.state(), DayState::StoryCompleted);
    assert_eq!(rx.recv().await.unwrap().points, 30);

    let calendar = CalendarAggregator::new(store, fast_retry())
        .build_view("learner", 2026)
        .await
        .unwrap();
    let day = calendar.view.day(10, 19).unwrap();
    assert!(day.has_story);
    let snapshot = day.story.as_ref().unwrap();
    assert!(snapshot.is_completed);
    assert_eq!(snapshot.progress_percentage, 83);
    assert_eq!(snapshot.learned_words, 2);
}

// ── Gating and exactly-once completion ───────────────────────────────────────

#[tokio::test]
async fn completion_refused_while_words_unknown() {
    let store = Arc::new(MemoryStore::new(TODAY));
    let (mut wf, mut rx) = workflow_over(store.clone());
    wf.request_story().await.unwrap();
    wf.interact("morning", WireStatus::Known).await.unwrap();
    wf.interact("coffee", WireStatus::NotLearned).await.unwrap();

    let err = wf.complete(1, 10).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::GatingFailed {
            daily_words_completed: 1,
            total_daily_words: 3
        }
    ));
    assert!(!store.story("learner", TODAY).unwrap().is_completed);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn second_session_never_emits_again() {
    let store = Arc::new(MemoryStore::new(TODAY));
    let (mut first, mut rx1) = workflow_over(store.clone());
    first.request_story().await.unwrap();
    for w in ["morning", "coffee", "window"] {
        first.interact(w, WireStatus::Known).await.unwrap();
    }
    first.complete(1, 10).await.unwrap();
    assert!(rx1.try_recv().is_ok());

    let (mut second, mut rx2) = workflow_over(store.clone());
    second.request_story().await.unwrap();
    assert_eq!(second.state(), DayState::StoryCompleted);
    assert_eq!(
        second.complete(1, 10).await.unwrap(),
        CompletionOutcome::AlreadyCompleted
    );
    assert!(rx2.try_recv().is_err());
    assert_eq!(store.completions().len(), 1);
}

#[tokio::test]
async fn racing_sessions_emit_only_once() {
    let store = Arc::new(MemoryStore::new(TODAY));
    let (mut a, mut rx_a) = workflow_over(store.clone());
    let (mut b, mut rx_b) = workflow_over(store.clone());
    a.request_story().await.unwrap();
    b.request_story().await.unwrap();
    for w in ["morning", "coffee", "window"] {
        a.interact(w, WireStatus::Known).await.unwrap();
        b.interact(w, WireStatus::Known).await.unwrap();
    }

    // Both local copies are in progress; only the store knows who wins.
    assert!(matches!(
        a.complete(1, 10).await.unwrap(),
        CompletionOutcome::Completed(_)
    ));
    assert_eq!(
        b.complete(1, 10).await.unwrap(),
        CompletionOutcome::AlreadyCompleted
    );
    assert_eq!(b.state(), DayState::StoryCompleted);

    assert!(rx_a.try_recv().is_ok());
    assert!(rx_b.try_recv().is_err());
    assert_eq!(store.completions().len(), 1);
}

#[tokio::test]
async fn interaction_after_completion_keeps_story_completed() {
    let store = Arc::new(MemoryStore::new(TODAY));
    let (mut wf, _rx) = workflow_over(store);
    wf.request_story().await.unwrap();
    for w in ["morning", "coffee", "window"] {
        wf.interact(w, WireStatus::Known).await.unwrap();
    }
    wf.complete(1, 10).await.unwrap();
    wf.interact("coffee", WireStatus::Unknown).await.unwrap();
    assert_eq!(wf.state(), DayState::StoryCompleted);
    assert_eq!(wf.refresh().await.unwrap(), DayState::StoryCompleted);
}

// ── Transient failures ───────────────────────────────────────────────────────

#[tokio::test]
async fn transient_request_failure_is_retried_without_duplicates() {
    let store = Arc::new(MemoryStore::new(TODAY));
    store.fail_next(
        StoreOperation::RequestTodayStory,
        StorageError::Timeout {
            operation: StoreOperation::RequestTodayStory,
        },
    );
    store.fail_next(
        StoreOperation::RequestTodayStory,
        StorageError::Unavailable {
            operation: StoreOperation::RequestTodayStory,
            message: "http status 503".to_string(),
        },
    );
    let (mut wf, _rx) = workflow_over(store.clone());
    wf.request_story().await.unwrap();
    assert_eq!(store.story_count(), 1);
}

#[tokio::test]
async fn exhausted_retries_leave_state_unchanged() {
    let store = Arc::new(MemoryStore::new(TODAY));
    for _ in 0..3 {
        store.fail_next(
            StoreOperation::RequestTodayStory,
            StorageError::Unavailable {
                operation: StoreOperation::RequestTodayStory,
                message: "down".to_string(),
            },
        );
    }
    let (mut wf, _rx) = workflow_over(store.clone());
    let err = wf.request_story().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(wf.state(), DayState::NoStoryToday);
    assert_eq!(store.story_count(), 0);

    wf.request_story().await.unwrap();
    assert_eq!(wf.state(), DayState::StoryInProgress);
}

#[tokio::test]
async fn quota_exhaustion_is_not_retried() {
    let store = Arc::new(MemoryStore::new(TODAY).with_daily_quota(0));
    let (mut wf, _rx) = workflow_over(store);
    let err = wf.request_story().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Storage(StorageError::QuotaExhausted { .. })
    ));
    assert_eq!(wf.state(), DayState::NoStoryToday);
}

// ── Slow store: timeouts and cancellation ────────────────────────────────────

/// Delegates to a [`MemoryStore`], sleeping before every call.
struct SlowStore {
    inner: MemoryStore,
    delay: Duration,
}

#[async_trait]
impl StoryStore for SlowStore {
    async fn check_today_story(&self, owner_id: &str) -> Result<TodayStatus, StorageError> {
        tokio::time::sleep(self.delay).await;
        self.inner.check_today_story(owner_id).await
    }

    async fn request_today_story(&self, owner_id: &str) -> Result<StoryRecord, StorageError> {
        tokio::time::sleep(self.delay).await;
        self.inner.request_today_story(owner_id).await
    }

    async fn get_today_story(&self, owner_id: &str) -> Result<StoryRecord, StorageError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_today_story(owner_id).await
    }

    async fn submit_word_interaction(
        &self,
        owner_id: &str,
        word: &str,
        observed: WireStatus,
    ) -> Result<(), StorageError> {
        tokio::time::sleep(self.delay).await;
        self.inner
            .submit_word_interaction(owner_id, word, observed)
            .await
    }

    async fn submit_completion(
        &self,
        owner_id: &str,
        submission: &CompletionSubmission,
    ) -> Result<CompletionAck, StorageError> {
        tokio::time::sleep(self.delay).await;
        self.inner.submit_completion(owner_id, submission).await
    }

    async fn get_can_proceed(
        &self,
        owner_id: &str,
    ) -> Result<Option<CanProceedRecord>, StorageError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_can_proceed(owner_id).await
    }

    async fn get_calendar_summary(
        &self,
        owner_id: &str,
        year: i32,
    ) -> Result<Option<CalendarSummary>, StorageError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_calendar_summary(owner_id, year).await
    }

    async fn list_stories(
        &self,
        owner_id: &str,
        year: i32,
    ) -> Result<Vec<StoryRecord>, StorageError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_stories(owner_id, year).await
    }

    async fn get_remaining_story_requests(
        &self,
        owner_id: &str,
    ) -> Result<RemainingRequests, StorageError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_remaining_story_requests(owner_id).await
    }
}

#[tokio::test(start_paused = true)]
async fn slow_store_times_out_and_state_is_untouched() {
    let store = Arc::new(SlowStore {
        inner: MemoryStore::new(TODAY),
        delay: Duration::from_secs(60),
    });
    let (mut wf, _rx) = workflow_over(store.clone());
    let err = wf.request_story().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Timeout {
            operation: StoreOperation::RequestTodayStory
        }
    ));
    assert_eq!(wf.state(), DayState::NoStoryToday);
    assert_eq!(store.inner.story_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_request_never_leaves_no_story_today() {
    let store = Arc::new(SlowStore {
        inner: MemoryStore::new(TODAY),
        delay: Duration::from_millis(100),
    });
    let (mut wf, _rx) = workflow_over(store.clone());

    let cancelled = tokio::time::timeout(Duration::from_millis(10), wf.request_story()).await;
    assert!(cancelled.is_err());
    assert_eq!(wf.state(), DayState::NoStoryToday);

    wf.request_story().await.unwrap();
    assert_eq!(wf.state(), DayState::StoryInProgress);
}

#[tokio::test(start_paused = true)]
async fn cancelled_completion_does_not_emit() {
    let store = Arc::new(SlowStore {
        inner: MemoryStore::new(TODAY),
        delay: Duration::from_millis(100),
    });
    let (mut wf, mut rx) = workflow_over(store.clone());
    wf.request_story().await.unwrap();
    for w in ["morning", "coffee", "window"] {
        wf.interact(w, WireStatus::Known).await.unwrap();
    }

    let cancelled = tokio::time::timeout(Duration::from_millis(10), wf.complete(1, 1)).await;
    assert!(cancelled.is_err());
    assert_eq!(wf.state(), DayState::StoryInProgress);
    assert!(rx.try_recv().is_err());

    assert!(matches!(
        wf.complete(1, 1).await.unwrap(),
        CompletionOutcome::Completed(_)
    ));
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
}

// ── Calendar ─────────────────────────────────────────────────────────────────

fn history(store: &MemoryStore) {
    let mut day = TODAY;
    for _ in 0..5 {
        day = day.previous_day().unwrap();
        let mut story = StoryRecord {
            id: format!("hist-{}", day),
            owner_id: "learner".to_string(),
            date: day,
            title: "old".to_string(),
            body: String::new(),
            translation: String::new(),
            words: storyday_storage::StoryTemplate::default().words,
            is_completed: day.day() % 2 == 0,
            created_at: String::new(),
            updated_at: String::new(),
        };
        story.words[0].status = storyday_core::WordStatus::Known;
        store.insert_story(story);
    }
}

#[tokio::test]
async fn calendar_paths_agree_on_history() {
    let with_summary = MemoryStore::new(TODAY);
    history(&with_summary);
    let without = MemoryStore::new(TODAY).with_summaries(false);
    history(&without);

    let a = CalendarAggregator::new(Arc::new(with_summary), fast_retry())
        .build_view("learner", 2026)
        .await
        .unwrap();
    let b = CalendarAggregator::new(Arc::new(without), fast_retry())
        .build_view("learner", 2026)
        .await
        .unwrap();

    assert_eq!(a.source, ViewSource::Summary);
    assert_eq!(b.source, ViewSource::Derived { degraded: false });
    assert_eq!(a.view, b.view);
    assert_eq!(a.view.story_days(), 5);
    assert!(!a.view.day(10, 19).unwrap().has_story);
    assert_eq!(a.view.month(10).unwrap().days.len(), 31);
}

#[tokio::test(start_paused = true)]
async fn calendar_summary_timeout_degrades_to_derived() {
    let inner = MemoryStore::new(TODAY);
    history(&inner);
    for _ in 0..3 {
        inner.fail_next(
            StoreOperation::GetCalendarSummary,
            StorageError::Timeout {
                operation: StoreOperation::GetCalendarSummary,
            },
        );
    }
    let outcome = CalendarAggregator::new(Arc::new(inner), fast_retry())
        .build_view("learner", 2026)
        .await
        .unwrap();
    assert!(outcome.is_degraded());
    assert_eq!(outcome.view.story_days(), 5);
}
