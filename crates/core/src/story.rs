//! Story and word records.
//!
//! A [`StoryRecord`] is one learner's story for one calendar day. Its words
//! split into daily-target words, which the learner must act on, and
//! complementary words shown for context only.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::status::WordStatus;

/// One word shown in a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEntry {
    pub word: String,
    pub meaning: String,
    #[serde(default)]
    pub example_sentence: String,
    #[serde(default)]
    pub example_sentence_translated: String,
    #[serde(default)]
    pub status: WordStatus,
    pub is_daily_target: bool,
}

impl WordEntry {
    /// A daily-target word with empty example sentences, in `Unknown` state.
    pub fn daily(word: &str, meaning: &str) -> Self {
        WordEntry {
            word: word.to_string(),
            meaning: meaning.to_string(),
            example_sentence: String::new(),
            example_sentence_translated: String::new(),
            status: WordStatus::Unknown,
            is_daily_target: true,
        }
    }

    /// A complementary (context-only) word in `Unknown` state.
    pub fn complementary(word: &str, meaning: &str) -> Self {
        WordEntry {
            is_daily_target: false,
            ..WordEntry::daily(word, meaning)
        }
    }

    pub fn with_status(mut self, status: WordStatus) -> Self {
        self.status = status;
        self
    }
}

/// A learner's story for a single calendar day.
///
/// The upstream store guarantees at most one record per `(owner_id, date)`.
/// Timestamps are RFC 3339 strings as handed over by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRecord {
    pub id: String,
    pub owner_id: String,
    #[serde(with = "day_format")]
    pub date: Date,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub words: Vec<WordEntry>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl StoryRecord {
    pub fn daily_words(&self) -> impl Iterator<Item = &WordEntry> {
        self.words.iter().filter(|w| w.is_daily_target)
    }

    pub fn complementary_words(&self) -> impl Iterator<Item = &WordEntry> {
        self.words.iter().filter(|w| !w.is_daily_target)
    }

    pub fn total_words(&self) -> usize {
        self.words.len()
    }

    pub fn daily_words_count(&self) -> usize {
        self.daily_words().count()
    }

    /// Look up a word entry by its text.
    pub fn word(&self, word: &str) -> Option<&WordEntry> {
        self.words.iter().find(|w| w.word == word)
    }

    /// Replace the entry for `entry.word`. Returns `false` if the story has
    /// no such word.
    pub fn replace_word(&mut self, entry: WordEntry) -> bool {
        match self.words.iter_mut().find(|w| w.word == entry.word) {
            Some(slot) => {
                *slot = entry;
                true
            }
            None => false,
        }
    }
}

/// Serde adapter for calendar days as `YYYY-MM-DD`.
pub mod day_format {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::macros::format_description;
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = date
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(serde::de::Error::custom)
    }

    /// Parse a `YYYY-MM-DD` day.
    pub fn parse(text: &str) -> Result<Date, time::error::Parse> {
        Date::parse(text, format_description!("[year]-[month]-[day]"))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
