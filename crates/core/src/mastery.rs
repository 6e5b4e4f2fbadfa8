//! Word-mastery transitions.
//!
//! A learner's interaction with a word reports an observed status; the word
//! simply takes the normalized observed status. There is no decay and no
//! interaction history on the entry, so applying the same observation twice
//! is a no-op the second time.

use crate::error::CoreError;
use crate::status::WireStatus;
use crate::story::WordEntry;

/// Apply an observed status to a word entry, returning the updated entry.
///
/// `NotLearned` is normalized to `Unknown` before it touches the entry.
pub fn apply_interaction(entry: &WordEntry, observed: WireStatus) -> WordEntry {
    WordEntry {
        status: observed.normalize(),
        ..entry.clone()
    }
}

/// Like [`apply_interaction`], for a status that arrives as untyped text.
///
/// Fails fast with [`CoreError::InvalidStatus`] on anything outside the
/// four-value vocabulary; nothing is coerced.
pub fn apply_raw_interaction(entry: &WordEntry, observed: &str) -> Result<WordEntry, CoreError> {
    let status: WireStatus = observed.parse()?;
    Ok(apply_interaction(entry, status))
}
