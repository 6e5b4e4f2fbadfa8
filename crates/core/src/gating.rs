//! Story-completion gate.
//!
//! The learner may proceed once no daily-target word is left `Unknown`.
//! Complementary words never block, and a story without daily words (or no
//! story at all) never blocks either.

use serde::{Deserialize, Serialize};

use crate::story::StoryRecord;

/// Outcome of evaluating the gate against a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    pub allowed: bool,
    pub daily_words_completed: u32,
    pub total_daily_words: u32,
    pub reason: String,
}

impl GateDecision {
    /// The decision when there is no story to gate on.
    pub fn open() -> Self {
        GateDecision {
            allowed: true,
            daily_words_completed: 0,
            total_daily_words: 0,
            reason: "no daily words to review".to_string(),
        }
    }

    /// Build a decision from counts alone, e.g. when the store answered
    /// the gate question itself.
    pub fn from_counts(daily_words_completed: u32, total_daily_words: u32) -> Self {
        if total_daily_words == 0 {
            return GateDecision::open();
        }
        let allowed = daily_words_completed >= total_daily_words;
        let reason = if allowed {
            "all daily words reviewed".to_string()
        } else {
            format!(
                "{} of {} daily words reviewed",
                daily_words_completed, total_daily_words
            )
        };
        GateDecision {
            allowed,
            daily_words_completed,
            total_daily_words,
            reason,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.total_daily_words
            .saturating_sub(self.daily_words_completed)
    }
}

/// Evaluate the gate for a story.
pub fn can_proceed(story: &StoryRecord) -> GateDecision {
    let (completed, total) = story
        .daily_words()
        .fold((0u32, 0u32), |(completed, total), entry| {
            let completed = completed + u32::from(entry.status.is_reviewed());
            (completed, total + 1)
        });
    GateDecision::from_counts(completed, total)
}
