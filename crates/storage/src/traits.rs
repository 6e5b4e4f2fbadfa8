use async_trait::async_trait;
use storyday_core::{CalendarSummary, StoryRecord, WireStatus};

use crate::error::StorageError;
use crate::record::{
    CanProceedRecord, CompletionAck, CompletionSubmission, RemainingRequests, TodayStatus,
};

/// The remote store that owns stories, words and users.
///
/// Every call is scoped by an explicit `owner_id` handed in by the caller's
/// session layer; implementations never look up an ambient identity.
///
/// ## Today
///
/// "Today" is the owner's local calendar day as the store sees it. The store
/// keeps at most one [`StoryRecord`] per `(owner_id, date)`. Asking for
/// today's story when one exists returns that record; a store MAY instead
/// answer `Err(StorageError::Conflict)`, which callers treat as "fetch the
/// existing one".
///
/// ## Retry safety
///
/// Mutating calls are idempotent: re-submitting the same word status or the
/// same completion leaves the store in the same state. Callers rely on this
/// to retry after [`StorageError::Timeout`] and
/// [`StorageError::Unavailable`].
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so one store can back
/// concurrent fetches from separate tasks.
#[async_trait]
pub trait StoryStore: Send + Sync + 'static {
    // ── Today's story ────────────────────────────────────────────────────────

    /// Whether the owner has a story today and whether one could be generated.
    async fn check_today_story(&self, owner_id: &str) -> Result<TodayStatus, StorageError>;

    /// Allocate today's story, or return the existing one.
    ///
    /// Returns `Err(StorageError::QuotaExhausted)` if no story exists and the
    /// owner has no requests left.
    async fn request_today_story(&self, owner_id: &str) -> Result<StoryRecord, StorageError>;

    /// Read today's story.
    ///
    /// Returns `Err(StorageError::NotFound)` if none has been requested yet.
    async fn get_today_story(&self, owner_id: &str) -> Result<StoryRecord, StorageError>;

    // ── Mutations ────────────────────────────────────────────────────────────

    /// Record the learner's observed status for one word of today's story.
    ///
    /// Implementations normalize `NotLearned` to `Unknown` before storing.
    async fn submit_word_interaction(
        &self,
        owner_id: &str,
        word: &str,
        observed: WireStatus,
    ) -> Result<(), StorageError>;

    /// Mark today's story completed. Completing an already completed story
    /// is a successful no-op answered with `newly_completed: false`, so
    /// concurrent sessions can tell which one made the transition.
    async fn submit_completion(
        &self,
        owner_id: &str,
        submission: &CompletionSubmission,
    ) -> Result<CompletionAck, StorageError>;

    // ── Queries ──────────────────────────────────────────────────────────────

    /// The store's own gate evaluation, if it serves one (`Ok(None)` if not).
    async fn get_can_proceed(
        &self,
        owner_id: &str,
    ) -> Result<Option<CanProceedRecord>, StorageError>;

    /// A pre-aggregated calendar for the year, if available (`Ok(None)` if not).
    async fn get_calendar_summary(
        &self,
        owner_id: &str,
        year: i32,
    ) -> Result<Option<CalendarSummary>, StorageError>;

    /// All of the owner's stories dated in `year`.
    async fn list_stories(&self, owner_id: &str, year: i32)
        -> Result<Vec<StoryRecord>, StorageError>;

    /// How many more stories the owner may request today.
    async fn get_remaining_story_requests(
        &self,
        owner_id: &str,
    ) -> Result<RemainingRequests, StorageError>;
}
