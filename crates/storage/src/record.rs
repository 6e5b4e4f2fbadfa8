use std::fmt;

use serde::{Deserialize, Serialize};

/// Answer to "does the owner have a story today, and could one be made?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStatus {
    pub has_story: bool,
    pub can_generate: bool,
}

/// The store's own evaluation of the completion gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanProceedRecord {
    pub can_proceed: bool,
    pub daily_words_completed: u32,
    pub total_daily_words: u32,
}

/// Remaining story-request quota. Managed by the store, only read here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingRequests {
    pub remaining: u32,
}

/// Payload for marking today's story complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSubmission {
    pub story_id: String,
    pub level: u32,
    pub points: u32,
}

/// The store's answer to a completion. `newly_completed` is false when the
/// story was already completed before this call, whoever completed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionAck {
    pub newly_completed: bool,
}

/// Every call a [`StoryStore`](crate::StoryStore) serves. Used in error
/// messages and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    CheckTodayStory,
    RequestTodayStory,
    GetTodayStory,
    SubmitWordInteraction,
    SubmitCompletion,
    GetCanProceed,
    GetCalendarSummary,
    ListStories,
    GetRemainingStoryRequests,
}

impl StoreOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreOperation::CheckTodayStory => "check_today_story",
            StoreOperation::RequestTodayStory => "request_today_story",
            StoreOperation::GetTodayStory => "get_today_story",
            StoreOperation::SubmitWordInteraction => "submit_word_interaction",
            StoreOperation::SubmitCompletion => "submit_completion",
            StoreOperation::GetCanProceed => "get_can_proceed",
            StoreOperation::GetCalendarSummary => "get_calendar_summary",
            StoreOperation::ListStories => "list_stories",
            StoreOperation::GetRemainingStoryRequests => "get_remaining_story_requests",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
