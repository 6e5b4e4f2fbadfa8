use storyday_core::CoreError;
use storyday_storage::{StorageError, StoreOperation};

/// Errors surfaced by the completion workflow and calendar aggregator.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// A status outside the four-value vocabulary. Never retried.
    #[error(transparent)]
    InvalidStatus(#[from] CoreError),

    /// Completion attempted while daily words remain unreviewed.
    #[error(
        "cannot complete story: {daily_words_completed} of {total_daily_words} daily words reviewed"
    )]
    GatingFailed {
        daily_words_completed: u32,
        total_daily_words: u32,
    },

    /// No story exists yet for the owner's current day.
    #[error("no story for today: owner {owner_id}")]
    NotFound { owner_id: String },

    /// The word is not part of today's story.
    #[error("word '{word}' is not in today's story")]
    UnknownWord { word: String },

    #[error("{operation} timed out")]
    Timeout { operation: StoreOperation },

    #[error("{operation} unavailable: {message}")]
    Unavailable {
        operation: StoreOperation,
        message: String,
    },

    /// A non-retryable store failure.
    #[error(transparent)]
    Storage(StorageError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl WorkflowError {
    /// Transient failures; the same call may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WorkflowError::Timeout { .. } | WorkflowError::Unavailable { .. }
        )
    }
}

impl From<StorageError> for WorkflowError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { owner_id } => WorkflowError::NotFound { owner_id },
            StorageError::UnknownWord { word, .. } => WorkflowError::UnknownWord { word },
            StorageError::Timeout { operation } => WorkflowError::Timeout { operation },
            StorageError::Unavailable { operation, message } => {
                WorkflowError::Unavailable { operation, message }
            }
            StorageError::InvalidStatus(e) => WorkflowError::InvalidStatus(e),
            other => WorkflowError::Storage(other),
        }
    }
}
