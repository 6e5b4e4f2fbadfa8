//! In-process [`StoryStore`] backend.
//!
//! Holds everything in a mutex-guarded map. Used by tests across the
//! workspace and by the CLI's offline commands; also the reference backend
//! the conformance suite is checked against.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use storyday_core::{
    can_proceed, CalendarSummary, StoryRecord, WireStatus, WordEntry, WordStatus,
};
use time::Date;

use crate::error::StorageError;
use crate::record::{
    CanProceedRecord, CompletionAck, CompletionSubmission, RemainingRequests, StoreOperation,
    TodayStatus,
};
use crate::traits::StoryStore;

/// Content used when the store allocates a new story.
#[derive(Debug, Clone)]
pub struct StoryTemplate {
    pub title: String,
    pub body: String,
    pub translation: String,
    pub words: Vec<WordEntry>,
}

impl StoryTemplate {
    pub fn new(title: &str, words: Vec<WordEntry>) -> Self {
        StoryTemplate {
            title: title.to_string(),
            body: String::new(),
            translation: String::new(),
            words,
        }
    }
}

impl Default for StoryTemplate {
    fn default() -> Self {
        StoryTemplate::new(
            "Daily story",
            vec![
                WordEntry::daily("morning", "manhã"),
                WordEntry::daily("coffee", "café"),
                WordEntry::daily("window", "janela"),
                WordEntry::complementary("quiet", "silencioso"),
            ],
        )
    }
}

struct Inner {
    today: Date,
    template: StoryTemplate,
    stories: BTreeMap<(String, Date), StoryRecord>,
    daily_quota: u32,
    requests_used: HashMap<(String, Date), u32>,
    serve_summaries: bool,
    serve_gate: bool,
    conflict_on_duplicate: bool,
    failures: HashMap<StoreOperation, VecDeque<StorageError>>,
    completions: Vec<CompletionSubmission>,
    next_id: u64,
}

impl Inner {
    /// Pop an injected failure for `operation`, if any.
    fn take_failure(&mut self, operation: StoreOperation) -> Result<(), StorageError> {
        match self.failures.get_mut(&operation).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn remaining(&self, owner_id: &str) -> u32 {
        let used = self
            .requests_used
            .get(&(owner_id.to_string(), self.today))
            .copied()
            .unwrap_or(0);
        self.daily_quota.saturating_sub(used)
    }

    fn today_story_mut(&mut self, owner_id: &str) -> Result<&mut StoryRecord, StorageError> {
        let key = (owner_id.to_string(), self.today);
        self.stories
            .get_mut(&key)
            .ok_or_else(|| StorageError::NotFound {
                owner_id: owner_id.to_string(),
            })
    }
}

/// A [`StoryStore`] kept entirely in memory.
///
/// By default it behaves like a well-behaved remote store: today's request
/// is idempotent, summaries and the gate are served, the daily quota is 1.
/// Builder methods switch individual behaviors off, and
/// [`fail_next`](MemoryStore::fail_next) queues failures for specific calls.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(today: Date) -> Self {
        MemoryStore {
            inner: Mutex::new(Inner {
                today,
                template: StoryTemplate::default(),
                stories: BTreeMap::new(),
                daily_quota: 1,
                requests_used: HashMap::new(),
                serve_summaries: true,
                serve_gate: true,
                conflict_on_duplicate: false,
                failures: HashMap::new(),
                completions: Vec::new(),
                next_id: 1,
            }),
        }
    }

    pub fn with_template(self, template: StoryTemplate) -> Self {
        self.lock().template = template;
        self
    }

    pub fn with_daily_quota(self, quota: u32) -> Self {
        self.lock().daily_quota = quota;
        self
    }

    /// Whether [`StoryStore::get_calendar_summary`] answers with a summary.
    pub fn with_summaries(self, serve: bool) -> Self {
        self.lock().serve_summaries = serve;
        self
    }

    /// Whether [`StoryStore::get_can_proceed`] answers with a gate record.
    pub fn with_remote_gate(self, serve: bool) -> Self {
        self.lock().serve_gate = serve;
        self
    }

    /// Answer a repeated today-request with `Conflict` instead of the
    /// existing record.
    pub fn with_conflict_on_duplicate(self, conflict: bool) -> Self {
        self.lock().conflict_on_duplicate = conflict;
        self
    }

    /// Seed a story record (e.g. history for calendar views).
    pub fn insert_story(&self, story: StoryRecord) {
        let key = (story.owner_id.clone(), story.date);
        self.lock().stories.insert(key, story);
    }

    pub fn set_today(&self, today: Date) {
        self.lock().today = today;
    }

    /// Make the next call to `operation` fail with `error`. Queued failures
    /// are consumed in order, one per call.
    pub fn fail_next(&self, operation: StoreOperation, error: StorageError) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    pub fn story(&self, owner_id: &str, date: Date) -> Option<StoryRecord> {
        self.lock()
            .stories
            .get(&(owner_id.to_string(), date))
            .cloned()
    }

    pub fn story_count(&self) -> usize {
        self.lock().stories.len()
    }

    /// Completion submissions that changed state, in arrival order.
    pub fn completions(&self) -> Vec<CompletionSubmission> {
        self.lock().completions.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Recover data even if mutex was poisoned by a panic in another thread
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

#[async_trait]
impl StoryStore for MemoryStore {
    async fn check_today_story(&self, owner_id: &str) -> Result<TodayStatus, StorageError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOperation::CheckTodayStory)?;
        let has_story = inner
            .stories
            .contains_key(&(owner_id.to_string(), inner.today));
        Ok(TodayStatus {
            has_story,
            can_generate: !has_story && inner.remaining(owner_id) > 0,
        })
    }

    async fn request_today_story(&self, owner_id: &str) -> Result<StoryRecord, StorageError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOperation::RequestTodayStory)?;
        let key = (owner_id.to_string(), inner.today);

        if let Some(existing) = inner.stories.get(&key) {
            if inner.conflict_on_duplicate {
                return Err(StorageError::Conflict {
                    owner_id: owner_id.to_string(),
                    date: inner.today.to_string(),
                });
            }
            return Ok(existing.clone());
        }

        if inner.remaining(owner_id) == 0 {
            return Err(StorageError::QuotaExhausted {
                owner_id: owner_id.to_string(),
            });
        }

        let now = now_rfc3339();
        let story = StoryRecord {
            id: format!("story-{}", inner.next_id),
            owner_id: owner_id.to_string(),
            date: inner.today,
            title: inner.template.title.clone(),
            body: inner.template.body.clone(),
            translation: inner.template.translation.clone(),
            words: inner.template.words.clone(),
            is_completed: false,
            created_at: now.clone(),
            updated_at: now,
        };
        inner.next_id += 1;
        *inner.requests_used.entry(key.clone()).or_insert(0) += 1;
        inner.stories.insert(key, story.clone());
        tracing::debug!(owner_id, story_id = %story.id, "allocated today's story");
        Ok(story)
    }

    async fn get_today_story(&self, owner_id: &str) -> Result<StoryRecord, StorageError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOperation::GetTodayStory)?;
        inner.today_story_mut(owner_id).map(|s| s.clone())
    }

    async fn submit_word_interaction(
        &self,
        owner_id: &str,
        word: &str,
        observed: WireStatus,
    ) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOperation::SubmitWordInteraction)?;
        let story = inner.today_story_mut(owner_id)?;
        let status: WordStatus = observed.normalize();
        let entry = story
            .words
            .iter_mut()
            .find(|w| w.word == word)
            .ok_or_else(|| StorageError::UnknownWord {
                owner_id: owner_id.to_string(),
                word: word.to_string(),
            })?;
        entry.status = status;
        story.updated_at = now_rfc3339();
        Ok(())
    }

    async fn submit_completion(
        &self,
        owner_id: &str,
        submission: &CompletionSubmission,
    ) -> Result<CompletionAck, StorageError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOperation::SubmitCompletion)?;
        let story = inner.today_story_mut(owner_id)?;
        if story.id != submission.story_id {
            return Err(StorageError::StoryMismatch {
                owner_id: owner_id.to_string(),
                story_id: submission.story_id.clone(),
            });
        }
        if story.is_completed {
            return Ok(CompletionAck {
                newly_completed: false,
            });
        }
        story.is_completed = true;
        story.updated_at = now_rfc3339();
        inner.completions.push(submission.clone());
        Ok(CompletionAck {
            newly_completed: true,
        })
    }

    async fn get_can_proceed(
        &self,
        owner_id: &str,
    ) -> Result<Option<CanProceedRecord>, StorageError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOperation::GetCanProceed)?;
        if !inner.serve_gate {
            return Ok(None);
        }
        let story = inner.today_story_mut(owner_id)?;
        let decision = can_proceed(story);
        Ok(Some(CanProceedRecord {
            can_proceed: decision.allowed,
            daily_words_completed: decision.daily_words_completed,
            total_daily_words: decision.total_daily_words,
        }))
    }

    async fn get_calendar_summary(
        &self,
        owner_id: &str,
        year: i32,
    ) -> Result<Option<CalendarSummary>, StorageError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOperation::GetCalendarSummary)?;
        if !inner.serve_summaries {
            return Ok(None);
        }
        let stories: Vec<StoryRecord> = inner.stories.values().cloned().collect();
        Ok(Some(CalendarSummary::from_stories(owner_id, year, &stories)))
    }

    async fn list_stories(
        &self,
        owner_id: &str,
        year: i32,
    ) -> Result<Vec<StoryRecord>, StorageError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOperation::ListStories)?;
        Ok(inner
            .stories
            .values()
            .filter(|s| s.owner_id == owner_id && s.date.year() == year)
            .cloned()
            .collect())
    }

    async fn get_remaining_story_requests(
        &self,
        owner_id: &str,
    ) -> Result<RemainingRequests, StorageError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOperation::GetRemainingStoryRequests)?;
        Ok(RemainingRequests {
            remaining: inner.remaining(owner_id),
        })
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    const TODAY: Date = date!(2026 - 10 - 19);

    #[tokio::test]
    async fn quota_limits_new_stories_not_rereads() {
        let store = MemoryStore::new(TODAY);
        assert_eq!(
            store.get_remaining_story_requests("u1").await.unwrap(),
            RemainingRequests { remaining: 1 }
        );
        let first = store.request_today_story("u1").await.unwrap();
        assert_eq!(
            store.get_remaining_story_requests("u1").await.unwrap(),
            RemainingRequests { remaining: 0 }
        );
        let again = store.request_today_story("u1").await.unwrap();
        assert_eq!(first.id, again.id);
    }

    #[tokio::test]
    async fn zero_quota_refuses_allocation() {
        let store = MemoryStore::new(TODAY).with_daily_quota(0);
        let status = store.check_today_story("u1").await.unwrap();
        assert!(!status.has_story);
        assert!(!status.can_generate);
        let err = store.request_today_story("u1").await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExhausted { .. }));
    }

    #[tokio::test]
    async fn quota_resets_on_a_new_day() {
        let store = MemoryStore::new(TODAY);
        store.request_today_story("u1").await.unwrap();
        store.set_today(date!(2026 - 10 - 20));
        let status = store.check_today_story("u1").await.unwrap();
        assert!(!status.has_story);
        assert!(status.can_generate);
        let next = store.request_today_story("u1").await.unwrap();
        assert_eq!(next.date, date!(2026 - 10 - 20));
        assert_eq!(store.story_count(), 2);
    }

    #[tokio::test]
    async fn conflict_mode_reports_duplicate() {
        let store = MemoryStore::new(TODAY).with_conflict_on_duplicate(true);
        store.request_today_story("u1").await.unwrap();
        let err = store.request_today_story("u1").await.unwrap_err();
        match err {
            StorageError::Conflict { owner_id, date } => {
                assert_eq!(owner_id, "u1");
                assert_eq!(date, "2026-10-19");
            }
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let store = MemoryStore::new(TODAY);
        store.fail_next(
            StoreOperation::CheckTodayStory,
            StorageError::Timeout {
                operation: StoreOperation::CheckTodayStory,
            },
        );
        assert!(matches!(
            store.check_today_story("u1").await,
            Err(StorageError::Timeout { .. })
        ));
        assert!(store.check_today_story("u1").await.is_ok());
    }

    #[tokio::test]
    async fn unknown_word_rejected() {
        let store = MemoryStore::new(TODAY);
        store.request_today_story("u1").await.unwrap();
        let err = store
            .submit_word_interaction("u1", "nonexistent", WireStatus::Known)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UnknownWord { .. }));
    }

    #[tokio::test]
    async fn disabled_summary_and_gate_answer_none() {
        let store = MemoryStore::new(TODAY)
            .with_summaries(false)
            .with_remote_gate(false);
        store.request_today_story("u1").await.unwrap();
        assert!(store.get_calendar_summary("u1", 2026).await.unwrap().is_none());
        assert!(store.get_can_proceed("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn completion_recorded_once() {
        let store = MemoryStore::new(TODAY);
        let story = store.request_today_story("u1").await.unwrap();
        let submission = CompletionSubmission {
            story_id: story.id.clone(),
            level: 2,
            points: 10,
        };
        let first = store.submit_completion("u1", &submission).await.unwrap();
        let second = store.submit_completion("u1", &submission).await.unwrap();
        assert!(first.newly_completed);
        assert!(!second.newly_completed);
        assert_eq!(store.completions(), vec![submission]);
        assert!(store.story("u1", TODAY).unwrap().is_completed);
    }
}
