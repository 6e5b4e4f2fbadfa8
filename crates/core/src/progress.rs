//! Derived per-story statistics.
//!
//! Only daily-target words count. A partially known word is worth half a
//! known word; the percentage is rounded half-up and is 0 for a story with
//! no daily words.

use serde::{Deserialize, Serialize};

use crate::status::WordStatus;
use crate::story::StoryRecord;

/// Progress over a story's daily-target words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub total_words: u32,
    pub known_count: u32,
    pub partially_known_count: u32,
    pub unknown_count: u32,
    pub progress_percentage: u8,
}

impl ProgressStats {
    /// Daily words in any state other than `Unknown`.
    pub fn reviewed_count(&self) -> u32 {
        self.known_count + self.partially_known_count
    }
}

/// Compute [`ProgressStats`] for a story.
pub fn compute_progress(story: &StoryRecord) -> ProgressStats {
    let mut stats = ProgressStats::default();
    for entry in story.daily_words() {
        stats.total_words += 1;
        match entry.status {
            WordStatus::Known => stats.known_count += 1,
            WordStatus::PartiallyKnown => stats.partially_known_count += 1,
            WordStatus::Unknown => stats.unknown_count += 1,
        }
    }
    stats.progress_percentage = percentage(
        stats.known_count,
        stats.partially_known_count,
        stats.total_words,
    );
    stats
}

/// `round_half_up(100 * (known + partial / 2) / total)`, in integers.
///
/// Doubling numerator and denominator keeps the half-word weight exact:
/// `floor((200k + 100p + t) / 2t)`.
fn percentage(known: u32, partial: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let known = u64::from(known);
    let partial = u64::from(partial);
    let total = u64::from(total);
    let value = (200 * known + 100 * partial + total) / (2 * total);
    value.min(100) as u8
}
