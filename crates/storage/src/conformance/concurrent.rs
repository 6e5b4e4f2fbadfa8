use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use storyday_core::{WireStatus, WordStatus};

use super::{request_or_get, Category, TestResult};
use crate::{StorageError, StoryStore};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::new(
        Category::Concurrency,
        "concurrent_requests_allocate_one_story",
        concurrent_requests_allocate_one_story(factory).await,
    ));
    results.push(TestResult::new(
        Category::Concurrency,
        "concurrent_owners_get_distinct_stories",
        concurrent_owners_get_distinct_stories(factory).await,
    ));
    results.push(TestResult::new(
        Category::Concurrency,
        "concurrent_interactions_on_distinct_words_all_land",
        concurrent_interactions_on_distinct_words_all_land(factory).await,
    ));

    results
}

// ── Racing today-requests ────────────────────────────────────────────────────

/// N tasks request today's story for one owner at once. Every task ends up
/// with the same story: either the record itself or a Conflict that points
/// at it.
async fn concurrent_requests_allocate_one_story<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);

    let mut handles = Vec::new();
    for _ in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            match s.request_today_story("owner-1").await {
                Ok(story) => Ok(Some(story.id)),
                Err(StorageError::Conflict { .. }) => Ok(None),
                Err(e) => Err(e),
            }
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let id = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: StorageError| format!("storage error: {e}"))?;
        if let Some(id) = id {
            ids.insert(id);
        }
    }

    let stored = storage
        .get_today_story("owner-1")
        .await
        .map_err(|e| format!("get after race: {e}"))?;
    if ids.len() > 1 {
        return Err(format!("racing requests produced {} stories: {:?}", ids.len(), ids));
    }
    if let Some(id) = ids.iter().next() {
        if *id != stored.id {
            return Err(format!("requests saw {id}, store holds {}", stored.id));
        }
    }
    Ok(())
}

// ── Independent owners ───────────────────────────────────────────────────────

async fn concurrent_owners_get_distinct_stories<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            let owner = format!("owner-{i}");
            let story = request_or_get(s.as_ref(), &owner).await?;
            if story.owner_id != owner {
                return Err(format!("{owner} got a story owned by {}", story.owner_id));
            }
            Ok(story.id)
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let id = handle.await.map_err(|e| format!("task panic: {e}"))??;
        ids.insert(id);
    }
    if ids.len() != N {
        return Err(format!("expected {N} distinct stories, got {}", ids.len()));
    }
    Ok(())
}

// ── Parallel word interactions ───────────────────────────────────────────────

/// Each daily word is marked KNOWN from its own task; none of the writes
/// may be lost.
async fn concurrent_interactions_on_distinct_words_all_land<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    let story = request_or_get(storage.as_ref(), "owner-1").await?;
    let words: Vec<String> = story.daily_words().map(|w| w.word.clone()).collect();

    let mut handles = Vec::new();
    for word in words.clone() {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            s.submit_word_interaction("owner-1", &word, WireStatus::Known)
                .await
        }));
    }
    for handle in handles {
        handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e| format!("storage error: {e}"))?;
    }

    let after = storage
        .get_today_story("owner-1")
        .await
        .map_err(|e| e.to_string())?;
    let lost: Vec<&String> = words
        .iter()
        .filter(|w| after.word(w).map(|e| e.status) != Some(WordStatus::Known))
        .collect();
    if !lost.is_empty() {
        return Err(format!("interactions lost for {:?}", lost));
    }
    Ok(())
}
