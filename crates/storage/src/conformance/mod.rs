//! Conformance test suite for `StoryStore` implementations.
//!
//! This module provides a backend-agnostic test suite that any `StoryStore`
//! implementation can run to verify correctness. The suite covers:
//!
//! - **Today**: idempotent story allocation, check/get consistency
//! - **Words**: interaction persistence and status normalization
//! - **Completion**: idempotent completion, story-id validation
//! - **Calendar**: owner/year scoping and summary consistency
//! - **Concurrency**: racing today-requests still yield one story
//! - **Error handling**: correct error variants for invalid calls
//!
//! The factory must return a fresh, empty store whose "today" is stable for
//! the duration of a test, whose daily request quota is at least 1, and
//! whose allocated stories contain at least one daily-target word.
//!
//! # Usage
//!
//! ```ignore
//! use storyday_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn http_conformance() {
//!     let report = run_conformance_suite("http", || async { test_http_store().await }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod calendar;
mod completion;
mod concurrent;
mod error;
mod today;
mod words;

use std::fmt;
use std::future::Future;

use storyday_core::StoryRecord;

use crate::{StorageError, StoryStore};

/// The area of the `StoryStore` contract a test exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Today,
    Words,
    Completion,
    Calendar,
    Concurrency,
    Errors,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Today,
        Category::Words,
        Category::Completion,
        Category::Calendar,
        Category::Concurrency,
        Category::Errors,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Today => "today",
            Category::Words => "words",
            Category::Completion => "completion",
            Category::Calendar => "calendar",
            Category::Concurrency => "concurrency",
            Category::Errors => "errors",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One conformance check. `failure` holds the reason when it did not pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub category: Category,
    pub name: &'static str,
    pub failure: Option<String>,
}

impl TestResult {
    fn new(category: Category, name: &'static str, outcome: Result<(), String>) -> Self {
        TestResult {
            category,
            name,
            failure: outcome.err(),
        }
    }

    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Outcome of running the suite against one backend.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    /// Label of the store under test, as given to [`run_conformance_suite`].
    pub backend: String,
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl ConformanceReport {
    fn new(backend: &str, results: Vec<TestResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        let total = results.len();
        ConformanceReport {
            backend: backend.to_string(),
            results,
            passed,
            failed: total - passed,
            total,
        }
    }

    /// `(passed, total)` for one category.
    pub fn tally(&self, category: Category) -> (usize, usize) {
        self.results
            .iter()
            .filter(|r| r.category == category)
            .fold((0, 0), |(p, t), r| (p + usize::from(r.passed()), t + 1))
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| !r.passed())
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "StoryStore conformance for {}: {}/{} checks passed",
            self.backend, self.passed, self.total
        )?;
        for category in Category::ALL {
            let (passed, total) = self.tally(category);
            if total > 0 {
                writeln!(f, "  {:<12} {}/{}", category, passed, total)?;
            }
        }
        for r in self.failures() {
            writeln!(
                f,
                "  FAIL {}::{}: {}",
                r.category,
                r.name,
                r.failure.as_deref().unwrap_or_default()
            )?;
        }
        Ok(())
    }
}

/// Run every check against a backend.
///
/// `backend` labels the report. `factory` is called once per check and must
/// return a fresh, empty store.
pub async fn run_conformance_suite<S, F, Fut>(backend: &str, factory: F) -> ConformanceReport
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(today::run_today_tests(&factory).await);
    results.extend(words::run_word_tests(&factory).await);
    results.extend(completion::run_completion_tests(&factory).await);
    results.extend(calendar::run_calendar_tests(&factory).await);
    results.extend(concurrent::run_concurrent_tests(&factory).await);
    results.extend(error::run_error_tests(&factory).await);

    let report = ConformanceReport::new(backend, results);
    tracing::debug!(
        backend,
        passed = report.passed,
        total = report.total,
        "conformance suite finished"
    );
    report
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Request today's story, accepting a `Conflict` answer by re-reading it.
async fn request_or_get<S: StoryStore>(s: &S, owner_id: &str) -> Result<StoryRecord, String> {
    match s.request_today_story(owner_id).await {
        Ok(story) => Ok(story),
        Err(StorageError::Conflict { .. }) => {
            s.get_today_story(owner_id).await.map_err(|e| e.to_string())
        }
        Err(e) => Err(e.to_string()),
    }
}

/// The first daily-target word of a story.
fn first_daily_word(story: &StoryRecord) -> Result<String, String> {
    story
        .daily_words()
        .next()
        .map(|w| w.word.clone())
        .ok_or_else(|| format!("story {} has no daily-target words", story.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ConformanceReport {
        ConformanceReport::new(
            "memory",
            vec![
                TestResult::new(Category::Today, "request_is_idempotent", Ok(())),
                TestResult::new(Category::Today, "get_after_request", Ok(())),
                TestResult::new(
                    Category::Completion,
                    "repeated_completion_is_noop",
                    Err("second completion reported a new transition".to_string()),
                ),
            ],
        )
    }

    #[test]
    fn counts_and_tallies() {
        let r = report();
        assert_eq!((r.passed, r.failed, r.total), (2, 1, 3));
        assert_eq!(r.tally(Category::Today), (2, 2));
        assert_eq!(r.tally(Category::Completion), (0, 1));
        assert_eq!(r.tally(Category::Calendar), (0, 0));
        assert_eq!(r.failures().count(), 1);
    }

    #[test]
    fn display_lists_categories_and_failures() {
        let text = report().to_string();
        assert!(text.starts_with("StoryStore conformance for memory: 2/3 checks passed"));
        assert!(text.contains("  today        2/2"));
        assert!(!text.contains("calendar"));
        assert!(text.contains(
            "FAIL completion::repeated_completion_is_noop: second completion reported a new transition"
        ));
    }
}
