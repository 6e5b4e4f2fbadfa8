//! Year calendar assembly over a [`StoryStore`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use storyday_core::{derive_from_stories, from_summary, CalendarView};
use storyday_storage::{StoreOperation, StoryStore};

use crate::error::WorkflowError;
use crate::retry::RetryPolicy;

/// Which adapter produced a [`CalendarView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ViewSource {
    /// Mapped from the store's pre-aggregated summary.
    Summary,
    /// Derived from the raw story list. `degraded` is set when the summary
    /// call failed, as opposed to the store simply not offering one.
    Derived { degraded: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarOutcome {
    pub view: CalendarView,
    pub source: ViewSource,
}

impl CalendarOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, ViewSource::Derived { degraded: true })
    }
}

/// Builds calendar views, preferring the store's summary.
///
/// Holds no cache; every call reads the store afresh, so views for
/// different years never mix.
pub struct CalendarAggregator<S: StoryStore> {
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<S: StoryStore> CalendarAggregator<S> {
    pub fn new(store: Arc<S>, retry: RetryPolicy) -> Self {
        CalendarAggregator { store, retry }
    }

    /// The owner's calendar for `year`.
    ///
    /// Fails only if the summary is missing or failed and the raw story
    /// list cannot be fetched either.
    pub async fn build_view(
        &self,
        owner_id: &str,
        year: i32,
    ) -> Result<CalendarOutcome, WorkflowError> {
        let store = &self.store;
        let summary = self
            .retry
            .run(StoreOperation::GetCalendarSummary, move || {
                store.get_calendar_summary(owner_id, year)
            })
            .await;

        let summary_failed = match summary {
            Ok(Some(summary)) if summary.year == year => {
                tracing::debug!(owner_id, year, "calendar built from store summary");
                return Ok(CalendarOutcome {
                    view: from_summary(&summary),
                    source: ViewSource::Summary,
                });
            }
            Ok(Some(summary)) => {
                tracing::warn!(
                    owner_id,
                    year,
                    summary_year = summary.year,
                    "store returned a summary for the wrong year, deriving instead"
                );
                true
            }
            Ok(None) => {
                tracing::debug!(owner_id, year, "no calendar summary offered, deriving");
                false
            }
            Err(e) => {
                tracing::warn!(owner_id, year, error = %e, "calendar summary failed, deriving");
                true
            }
        };

        let stories = self
            .retry
            .run(StoreOperation::ListStories, move || {
                store.list_stories(owner_id, year)
            })
            .await?;

        Ok(CalendarOutcome {
            view: derive_from_stories(owner_id, year, &stories),
            source: ViewSource::Derived {
                degraded: summary_failed,
            },
        })
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
