use std::future::Future;

use storyday_core::WireStatus;

use super::{request_or_get, Category, TestResult};
use crate::{CompletionSubmission, StorageError, StoryStore};

pub(super) async fn run_error_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::new(
        Category::Errors,
        "get_today_story_before_request",
        get_today_story_before_request(factory).await,
    ));
    results.push(TestResult::new(
        Category::Errors,
        "not_found_names_owner",
        not_found_names_owner(factory).await,
    ));
    results.push(TestResult::new(
        Category::Errors,
        "interaction_without_story",
        interaction_without_story(factory).await,
    ));
    results.push(TestResult::new(
        Category::Errors,
        "completion_without_story",
        completion_without_story(factory).await,
    ));
    results.push(TestResult::new(
        Category::Errors,
        "interaction_on_unknown_word",
        interaction_on_unknown_word(factory).await,
    ));
    results.push(TestResult::new(
        Category::Errors,
        "list_stories_empty_for_new_owner",
        list_stories_empty_for_new_owner(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn get_today_story_before_request<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get_today_story("owner-1").await {
        Err(StorageError::NotFound { .. }) => Ok(()),
        other => Err(format!("expected NotFound, got {:?}", other)),
    }
}

async fn not_found_names_owner<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get_today_story("owner-42").await {
        Err(StorageError::NotFound { owner_id }) => {
            if owner_id != "owner-42" {
                return Err(format!("expected owner_id \"owner-42\", got \"{owner_id}\""));
            }
            Ok(())
        }
        other => Err(format!("expected NotFound, got {:?}", other)),
    }
}

async fn interaction_without_story<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s
        .submit_word_interaction("owner-1", "anything", WireStatus::Known)
        .await
    {
        Err(StorageError::NotFound { .. }) => Ok(()),
        other => Err(format!("expected NotFound, got {:?}", other)),
    }
}

async fn completion_without_story<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let submission = CompletionSubmission {
        story_id: "story-1".to_string(),
        level: 1,
        points: 10,
    };
    match s.submit_completion("owner-1", &submission).await {
        Err(StorageError::NotFound { .. }) => Ok(()),
        other => Err(format!("expected NotFound, got {:?}", other)),
    }
}

async fn interaction_on_unknown_word<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    request_or_get(&s, "owner-1").await?;
    match s
        .submit_word_interaction("owner-1", "no-such-word-xyz", WireStatus::Known)
        .await
    {
        Err(StorageError::UnknownWord { word, .. }) if word == "no-such-word-xyz" => Ok(()),
        other => Err(format!("expected UnknownWord, got {:?}", other)),
    }
}

async fn list_stories_empty_for_new_owner<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let listed = s
        .list_stories("owner-1", 2026)
        .await
        .map_err(|e| e.to_string())?;
    if !listed.is_empty() {
        return Err(format!("expected no stories, got {}", listed.len()));
    }
    Ok(())
}
