use std::future::Future;

use super::{request_or_get, Category, TestResult};
use crate::StoryStore;

pub(super) async fn run_today_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::new(
        Category::Today,
        "check_before_request_reports_no_story",
        check_before_request_reports_no_story(factory).await,
    ));
    results.push(TestResult::new(
        Category::Today,
        "request_returns_owner_scoped_story",
        request_returns_owner_scoped_story(factory).await,
    ));
    results.push(TestResult::new(
        Category::Today,
        "request_is_idempotent",
        request_is_idempotent(factory).await,
    ));
    results.push(TestResult::new(
        Category::Today,
        "check_after_request_reports_story",
        check_after_request_reports_story(factory).await,
    ));
    results.push(TestResult::new(
        Category::Today,
        "get_returns_requested_story",
        get_returns_requested_story(factory).await,
    ));
    results.push(TestResult::new(
        Category::Today,
        "owners_are_independent",
        owners_are_independent(factory).await,
    ));
    results.push(TestResult::new(
        Category::Today,
        "new_story_starts_incomplete",
        new_story_starts_incomplete(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

/// A fresh store has no story for the owner, but one can be generated.
async fn check_before_request_reports_no_story<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let status = s
        .check_today_story("owner-1")
        .await
        .map_err(|e| e.to_string())?;
    if status.has_story {
        return Err("expected has_story = false on an empty store".to_string());
    }
    if !status.can_generate {
        return Err("expected can_generate = true with quota available".to_string());
    }
    Ok(())
}

/// The allocated story belongs to the requesting owner.
async fn request_returns_owner_scoped_story<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let story = s
        .request_today_story("owner-1")
        .await
        .map_err(|e| e.to_string())?;
    if story.owner_id != "owner-1" {
        return Err(format!("expected owner \"owner-1\", got \"{}\"", story.owner_id));
    }
    if story.id.is_empty() {
        return Err("story id must not be empty".to_string());
    }
    Ok(())
}

/// Requesting twice yields the same record (or Conflict, then the same record).
async fn request_is_idempotent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let first = request_or_get(&s, "owner-1").await?;
    let second = request_or_get(&s, "owner-1").await?;
    if first.id != second.id {
        return Err(format!(
            "second request returned a different story: {} vs {}",
            first.id, second.id
        ));
    }
    if first.date != second.date {
        return Err("second request returned a different date".to_string());
    }
    Ok(())
}

async fn check_after_request_reports_story<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    request_or_get(&s, "owner-1").await?;
    let status = s
        .check_today_story("owner-1")
        .await
        .map_err(|e| e.to_string())?;
    if !status.has_story {
        return Err("expected has_story = true after request".to_string());
    }
    if status.can_generate {
        return Err("expected can_generate = false once today's story exists".to_string());
    }
    Ok(())
}

async fn get_returns_requested_story<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let requested = request_or_get(&s, "owner-1").await?;
    let fetched = s
        .get_today_story("owner-1")
        .await
        .map_err(|e| e.to_string())?;
    if requested != fetched {
        return Err(format!(
            "get_today_story differs from requested story: {:?} vs {:?}",
            requested.id, fetched.id
        ));
    }
    Ok(())
}

/// One owner's story is invisible to another owner.
async fn owners_are_independent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mine = request_or_get(&s, "owner-1").await?;
    let status = s
        .check_today_story("owner-2")
        .await
        .map_err(|e| e.to_string())?;
    if status.has_story {
        return Err("owner-2 sees a story it never requested".to_string());
    }
    let theirs = request_or_get(&s, "owner-2").await?;
    if mine.id == theirs.id {
        return Err("two owners share one story id".to_string());
    }
    Ok(())
}

async fn new_story_starts_incomplete<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let story = request_or_get(&s, "owner-1").await?;
    if story.is_completed {
        return Err("a freshly allocated story must not be completed".to_string());
    }
    Ok(())
}
