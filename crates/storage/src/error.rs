use storyday_core::CoreError;

use crate::record::StoreOperation;

/// All errors that can be returned by a [`StoryStore`](crate::StoryStore)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No story exists for the owner's current day.
    #[error("no story for today: owner {owner_id}")]
    NotFound { owner_id: String },

    /// The story id does not match the owner's story for today.
    #[error("story {story_id} is not today's story for owner {owner_id}")]
    StoryMismatch { owner_id: String, story_id: String },

    /// The word is not part of today's story.
    #[error("word '{word}' is not in today's story for owner {owner_id}")]
    UnknownWord { owner_id: String, word: String },

    /// The store refused to create a second story for the same day.
    #[error("story already exists for owner {owner_id} on {date}")]
    Conflict { owner_id: String, date: String },

    /// The owner has no story requests left today.
    #[error("no story requests remaining for owner {owner_id}")]
    QuotaExhausted { owner_id: String },

    /// The call did not complete within its deadline.
    #[error("{operation} timed out")]
    Timeout { operation: StoreOperation },

    /// The store could not be reached or answered with a transient failure.
    #[error("{operation} unavailable: {message}")]
    Unavailable {
        operation: StoreOperation,
        message: String,
    },

    /// The store was handed (or returned) a status outside the vocabulary.
    #[error(transparent)]
    InvalidStatus(#[from] CoreError),

    /// A backend-specific failure (serialization, unexpected response, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Transient failures that are safe to retry.
    ///
    /// Every mutating store call is idempotent or check-then-act, so a retry
    /// after a timeout cannot apply a mutation twice.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::Timeout { .. } | StorageError::Unavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(StorageError::Timeout {
            operation: StoreOperation::GetTodayStory
        }
        .is_retryable());
        assert!(StorageError::Unavailable {
            operation: StoreOperation::ListStories,
            message: "503".to_string()
        }
        .is_retryable());
        assert!(!StorageError::NotFound {
            owner_id: "u1".to_string()
        }
        .is_retryable());
        assert!(!StorageError::Backend("bad json".to_string()).is_retryable());
    }

    #[test]
    fn display_names_operation() {
        let err = StorageError::Timeout {
            operation: StoreOperation::SubmitCompletion,
        };
        assert_eq!(err.to_string(), "submit_completion timed out");
    }
}
