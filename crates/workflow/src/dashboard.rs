//! Concurrent fetch of everything a "today" screen shows.

use std::sync::Arc;

use storyday_core::{compute_progress, ProgressStats, StoryRecord};
use storyday_storage::{RemainingRequests, StorageError, StoreOperation, StoryStore};

use crate::calendar::{CalendarAggregator, CalendarOutcome};
use crate::error::WorkflowError;
use crate::retry::RetryPolicy;

/// Independent results of the dashboard fetches. Each part may fail on its
/// own without affecting the others.
#[derive(Debug)]
pub struct Dashboard {
    pub calendar: Result<CalendarOutcome, WorkflowError>,
    /// `Ok(None)` when no story has been requested today.
    pub today: Result<Option<StoryRecord>, WorkflowError>,
    pub remaining: Result<RemainingRequests, WorkflowError>,
}

impl Dashboard {
    pub fn progress(&self) -> Option<ProgressStats> {
        match &self.today {
            Ok(Some(story)) => Some(compute_progress(story)),
            _ => None,
        }
    }

    /// True if any part failed or the calendar came from a degraded path.
    pub fn is_partial(&self) -> bool {
        self.today.is_err()
            || self.remaining.is_err()
            || self.calendar.as_ref().map_or(true, CalendarOutcome::is_degraded)
    }
}

/// Fetch the year's calendar, today's story and the remaining request quota
/// concurrently.
pub async fn fetch_dashboard<S: StoryStore>(
    store: Arc<S>,
    owner_id: &str,
    year: i32,
    retry: RetryPolicy,
) -> Dashboard {
    let aggregator = CalendarAggregator::new(store.clone(), retry);
    let store = store.as_ref();

    let (calendar, today, remaining) = tokio::join!(
        aggregator.build_view(owner_id, year),
        retry.run(StoreOperation::GetTodayStory, move || {
            store.get_today_story(owner_id)
        }),
        retry.run(StoreOperation::GetRemainingStoryRequests, move || {
            store.get_remaining_story_requests(owner_id)
        }),
    );

    let today = match today {
        Ok(story) => Ok(Some(story)),
        Err(StorageError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    };

    let dashboard = Dashboard {
        calendar,
        today,
        remaining: remaining.map_err(WorkflowError::from),
    };
    if dashboard.is_partial() {
        tracing::warn!(owner_id, year, "dashboard fetched with partial results");
    }
    dashboard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ViewSource;
    use storyday_storage::MemoryStore;
    use time::macros::date;

    #[tokio::test]
    async fn all_parts_present() {
        let store = Arc::new(MemoryStore::new(date!(2026 - 10 - 19)).with_daily_quota(2));
        store.request_today_story("u1").await.unwrap();

        let dash = fetch_dashboard(store, "u1", 2026, RetryPolicy::default()).await;
        assert_eq!(dash.calendar.as_ref().unwrap().source, ViewSource::Summary);
        assert!(dash.today.as_ref().unwrap().is_some());
        assert_eq!(dash.remaining.as_ref().unwrap().remaining, 1);
        assert_eq!(dash.progress().unwrap().progress_percentage, 0);
        assert!(!dash.is_partial());
    }

    #[tokio::test]
    async fn missing_story_is_not_an_error() {
        let store = Arc::new(MemoryStore::new(date!(2026 - 10 - 19)));
        let dash = fetch_dashboard(store, "u1", 2026, RetryPolicy::default()).await;
        assert!(dash.today.as_ref().unwrap().is_none());
        assert!(dash.progress().is_none());
        assert!(!dash.is_partial());
    }

    #[tokio::test]
    async fn one_failure_leaves_others_usable() {
        let store = Arc::new(MemoryStore::new(date!(2026 - 10 - 19)));
        store.request_today_story("u1").await.unwrap();
        store.fail_next(
            StoreOperation::GetRemainingStoryRequests,
            StorageError::Backend("quota service down".to_string()),
        );

        let dash = fetch_dashboard(store, "u1", 2026, RetryPolicy::default()).await;
        assert!(dash.remaining.is_err());
        assert!(dash.today.as_ref().unwrap().is_some());
        assert!(dash.calendar.is_ok());
        assert!(dash.is_partial());
    }
}
