//! The per-day completion state machine.
//!
//! ```text
//! NoStoryToday --request_story--> StoryInProgress --complete--> StoryCompleted
//!                                   |        ^
//!                                   +interact+
//! ```
//!
//! [`CompletionWorkflow`] holds a local copy of today's story and only
//! changes it after the corresponding store call has returned successfully.
//! Dropping an in-flight call therefore leaves the workflow where it was.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use storyday_core::{
    apply_interaction, can_proceed, compute_progress, GateDecision, ProgressStats, StoryRecord,
    WireStatus, WordEntry,
};
use storyday_storage::{CompletionSubmission, StorageError, StoreOperation, StoryStore};
use time::Date;

use crate::error::WorkflowError;
use crate::events::{CompletionSink, StoryCompleted};
use crate::retry::RetryPolicy;

// ──────────────────────────────────────────────
// States and outcomes
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayState {
    NoStoryToday,
    StoryInProgress,
    StoryCompleted,
}

impl DayState {
    pub fn as_str(self) -> &'static str {
        match self {
            DayState::NoStoryToday => "NO_STORY_TODAY",
            DayState::StoryInProgress => "STORY_IN_PROGRESS",
            DayState::StoryCompleted => "STORY_COMPLETED",
        }
    }
}

impl std::fmt::Display for DayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a gate decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateSource {
    /// The store answered `GetCanProceed`.
    Remote,
    /// Computed from the local story copy.
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateCheck {
    #[serde(flatten)]
    pub decision: GateDecision,
    pub source: GateSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The story was completed by this call; the event has been emitted.
    Completed(StoryCompleted),
    /// The story was already completed. Nothing was emitted.
    AlreadyCompleted,
}

// ──────────────────────────────────────────────
// Workflow
// ──────────────────────────────────────────────

/// Drives one owner's day: request, interact, complete.
pub struct CompletionWorkflow<S: StoryStore> {
    store: Arc<S>,
    sink: Arc<dyn CompletionSink>,
    owner_id: String,
    today: Date,
    retry: RetryPolicy,
    story: Option<StoryRecord>,
    /// Story dates this workflow has emitted a completion event for.
    emitted: HashSet<Date>,
}

impl<S: StoryStore> CompletionWorkflow<S> {
    pub fn new(
        store: Arc<S>,
        sink: Arc<dyn CompletionSink>,
        owner_id: &str,
        today: Date,
        retry: RetryPolicy,
    ) -> Self {
        CompletionWorkflow {
            store,
            sink,
            owner_id: owner_id.to_string(),
            today,
            retry,
            story: None,
            emitted: HashSet::new(),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn today(&self) -> Date {
        self.today
    }

    pub fn state(&self) -> DayState {
        match &self.story {
            None => DayState::NoStoryToday,
            Some(story) if story.is_completed => DayState::StoryCompleted,
            Some(_) => DayState::StoryInProgress,
        }
    }

    /// The local copy of today's story, if one has been loaded.
    pub fn story(&self) -> Option<&StoryRecord> {
        self.story.as_ref()
    }

    pub fn progress(&self) -> Option<ProgressStats> {
        self.story.as_ref().map(compute_progress)
    }

    // ── Transitions ──────────────────────────────────────────────────────

    /// Re-sync the local copy with the store.
    ///
    /// Safe to call from any scheduler (timer, focus event, manual). A
    /// completed story never reverts to in progress.
    pub async fn refresh(&mut self) -> Result<DayState, WorkflowError> {
        let store = &self.store;
        let owner_id = self.owner_id.as_str();
        let status = self
            .retry
            .run(StoreOperation::CheckTodayStory, move || {
                store.check_today_story(owner_id)
            })
            .await?;

        if !status.has_story {
            self.forget_story();
            return Ok(self.state());
        }

        match self.fetch_today().await {
            Ok(story) => self.adopt(story),
            Err(StorageError::NotFound { .. }) => self.forget_story(),
            Err(e) => return Err(e.into()),
        }
        Ok(self.state())
    }

    /// Get today's story, asking the store to allocate it if needed.
    ///
    /// Idempotent: once a story is loaded it is returned without a store
    /// call. A `Conflict` from the store means the story already exists and
    /// is fetched instead.
    pub async fn request_story(&mut self) -> Result<&StoryRecord, WorkflowError> {
        if self.story.is_none() {
            let story = self.request_or_fetch().await?;
            self.adopt(story);
        }
        self.story.as_ref().ok_or_else(|| WorkflowError::NotFound {
            owner_id: self.owner_id.clone(),
        })
    }

    /// Record the learner's observed status for one word.
    ///
    /// The word is validated against the local story before any store call.
    /// The status is normalized before it is sent, whether or not the store
    /// normalizes too.
    pub async fn interact(
        &mut self,
        word: &str,
        observed: WireStatus,
    ) -> Result<WordEntry, WorkflowError> {
        let story = self.loaded_story()?;
        let entry = story.word(word).ok_or_else(|| WorkflowError::UnknownWord {
            word: word.to_string(),
        })?;
        let updated = apply_interaction(entry, observed);
        let normalized = WireStatus::from(updated.status);

        let store = &self.store;
        let owner_id = self.owner_id.as_str();
        self.retry
            .run(StoreOperation::SubmitWordInteraction, move || {
                store.submit_word_interaction(owner_id, word, normalized)
            })
            .await?;

        if let Some(story) = self.story.as_mut() {
            story.replace_word(updated.clone());
        }
        tracing::debug!(
            owner_id = %self.owner_id,
            word,
            status = %updated.status,
            "word interaction recorded"
        );
        Ok(updated)
    }

    /// Like [`interact`](Self::interact) with a raw status string. An
    /// unrecognized status fails before anything is sent.
    pub async fn interact_raw(
        &mut self,
        word: &str,
        observed: &str,
    ) -> Result<WordEntry, WorkflowError> {
        let observed: WireStatus = observed.parse()?;
        self.interact(word, observed).await
    }

    /// Gate decision from the local story copy.
    pub fn local_gate(&self) -> GateDecision {
        self.story
            .as_ref()
            .map(can_proceed)
            .unwrap_or_else(GateDecision::open)
    }

    /// Ask the store for its gate decision, falling back to the local one
    /// when the store does not serve it or cannot be reached.
    pub async fn check_gate(&self) -> GateCheck {
        let store = &self.store;
        let owner_id = self.owner_id.as_str();
        let remote = self
            .retry
            .run(StoreOperation::GetCanProceed, move || {
                store.get_can_proceed(owner_id)
            })
            .await;

        match remote {
            Ok(Some(record)) => {
                let decision =
                    GateDecision::from_counts(record.daily_words_completed, record.total_daily_words);
                if decision.allowed != record.can_proceed {
                    tracing::warn!(
                        owner_id = %self.owner_id,
                        remote = record.can_proceed,
                        completed = record.daily_words_completed,
                        total = record.total_daily_words,
                        "store gate flag disagrees with its own counts, using counts"
                    );
                }
                GateCheck {
                    decision,
                    source: GateSource::Remote,
                }
            }
            Ok(None) => {
                tracing::debug!(owner_id = %self.owner_id, "store serves no gate, computing locally");
                self.local_gate_check()
            }
            Err(StorageError::NotFound { .. }) => self.local_gate_check(),
            Err(e) => {
                tracing::warn!(owner_id = %self.owner_id, error = %e, "remote gate failed, computing locally");
                self.local_gate_check()
            }
        }
    }

    /// Complete today's story.
    ///
    /// Rejected with `GatingFailed` while daily words remain unreviewed.
    /// On success the completion is persisted, then a [`StoryCompleted`]
    /// event is emitted. A story that is already completed yields
    /// `AlreadyCompleted` and no event, whether this workflow saw that
    /// locally or the store's ack says another session got there first.
    pub async fn complete(
        &mut self,
        level: u32,
        points: u32,
    ) -> Result<CompletionOutcome, WorkflowError> {
        let story = self.loaded_story()?;
        if story.is_completed || self.emitted.contains(&story.date) {
            tracing::info!(
                owner_id = %self.owner_id,
                story_id = %story.id,
                "story already completed, no event emitted"
            );
            return Ok(CompletionOutcome::AlreadyCompleted);
        }

        let gate = can_proceed(story);
        if !gate.allowed {
            return Err(WorkflowError::GatingFailed {
                daily_words_completed: gate.daily_words_completed,
                total_daily_words: gate.total_daily_words,
            });
        }

        let submission = CompletionSubmission {
            story_id: story.id.clone(),
            level,
            points,
        };
        let date = story.date;

        let store = &self.store;
        let owner_id = self.owner_id.as_str();
        let submitted = &submission;
        let ack = self
            .retry
            .run(StoreOperation::SubmitCompletion, move || {
                store.submit_completion(owner_id, submitted)
            })
            .await?;

        if let Some(story) = self.story.as_mut() {
            story.is_completed = true;
        }
        if !ack.newly_completed {
            tracing::info!(
                owner_id = %self.owner_id,
                story_id = %submission.story_id,
                "store already had the story completed, no event emitted"
            );
            return Ok(CompletionOutcome::AlreadyCompleted);
        }
        self.emitted.insert(date);

        let event = StoryCompleted {
            owner_id: self.owner_id.clone(),
            story_id: submission.story_id,
            date,
            level,
            points,
        };
        tracing::info!(
            owner_id = %self.owner_id,
            story_id = %event.story_id,
            from = %DayState::StoryInProgress,
            to = %DayState::StoryCompleted,
            "day state transition"
        );
        self.sink.emit(event.clone());
        Ok(CompletionOutcome::Completed(event))
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn loaded_story(&self) -> Result<&StoryRecord, WorkflowError> {
        self.story.as_ref().ok_or_else(|| WorkflowError::NotFound {
            owner_id: self.owner_id.clone(),
        })
    }

    fn local_gate_check(&self) -> GateCheck {
        GateCheck {
            decision: self.local_gate(),
            source: GateSource::Local,
        }
    }

    async fn fetch_today(&self) -> Result<StoryRecord, StorageError> {
        let store = &self.store;
        let owner_id = self.owner_id.as_str();
        self.retry
            .run(StoreOperation::GetTodayStory, move || {
                store.get_today_story(owner_id)
            })
            .await
    }

    async fn request_or_fetch(&self) -> Result<StoryRecord, WorkflowError> {
        let store = &self.store;
        let owner_id = self.owner_id.as_str();
        let requested = self
            .retry
            .run(StoreOperation::RequestTodayStory, move || {
                store.request_today_story(owner_id)
            })
            .await;

        match requested {
            Ok(story) => Ok(story),
            Err(StorageError::Conflict { date, .. }) => {
                tracing::info!(
                    owner_id = %self.owner_id,
                    %date,
                    "story already exists, fetching it"
                );
                Ok(self.fetch_today().await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the local copy, never reverting a completed story.
    fn adopt(&mut self, mut fetched: StoryRecord) {
        if fetched.date != self.today {
            tracing::warn!(
                owner_id = %self.owner_id,
                expected = %self.today,
                got = %fetched.date,
                "store's today differs from the workflow's"
            );
        }
        let was_completed = self
            .story
            .as_ref()
            .is_some_and(|s| s.id == fetched.id && s.is_completed);
        if !fetched.is_completed && (was_completed || self.emitted.contains(&fetched.date)) {
            tracing::warn!(
                owner_id = %self.owner_id,
                story_id = %fetched.id,
                "store returned a stale record for a completed story, keeping completion"
            );
            fetched.is_completed = true;
        }

        let before = self.state();
        self.story = Some(fetched);
        let after = self.state();
        if before != after {
            tracing::info!(
                owner_id = %self.owner_id,
                from = %before,
                to = %after,
                "day state transition"
            );
        }
    }

    fn forget_story(&mut self) {
        let keep = self
            .story
            .as_ref()
            .is_some_and(|s| s.is_completed && s.date == self.today);
        if keep {
            tracing::warn!(
                owner_id = %self.owner_id,
                "store reports no story today but today's story was completed, keeping it"
            );
            return;
        }
        if self.story.take().is_some() {
            tracing::info!(owner_id = %self.owner_id, "no story for today, local copy cleared");
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
