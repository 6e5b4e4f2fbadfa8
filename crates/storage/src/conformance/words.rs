use std::future::Future;

use storyday_core::{WireStatus, WordStatus};

use super::{first_daily_word, request_or_get, Category, TestResult};
use crate::StoryStore;

pub(super) async fn run_word_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::new(
        Category::Words,
        "interaction_persists_status",
        interaction_persists_status(factory).await,
    ));
    results.push(TestResult::new(
        Category::Words,
        "not_learned_stored_as_unknown",
        not_learned_stored_as_unknown(factory).await,
    ));
    results.push(TestResult::new(
        Category::Words,
        "repeated_interaction_is_idempotent",
        repeated_interaction_is_idempotent(factory).await,
    ));
    results.push(TestResult::new(
        Category::Words,
        "interaction_does_not_complete_story",
        interaction_does_not_complete_story(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn interaction_persists_status<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let story = request_or_get(&s, "owner-1").await?;
    let word = first_daily_word(&story)?;
    s.submit_word_interaction("owner-1", &word, WireStatus::Known)
        .await
        .map_err(|e| e.to_string())?;
    let after = s
        .get_today_story("owner-1")
        .await
        .map_err(|e| e.to_string())?;
    let status = after
        .word(&word)
        .map(|w| w.status)
        .ok_or_else(|| format!("word '{}' disappeared from story", word))?;
    if status != WordStatus::Known {
        return Err(format!("expected KNOWN, got {}", status));
    }
    Ok(())
}

/// `NOT_LEARNED` comes back as the canonical `UNKNOWN`.
async fn not_learned_stored_as_unknown<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let story = request_or_get(&s, "owner-1").await?;
    let word = first_daily_word(&story)?;
    s.submit_word_interaction("owner-1", &word, WireStatus::Known)
        .await
        .map_err(|e| e.to_string())?;
    s.submit_word_interaction("owner-1", &word, WireStatus::NotLearned)
        .await
        .map_err(|e| e.to_string())?;
    let after = s
        .get_today_story("owner-1")
        .await
        .map_err(|e| e.to_string())?;
    match after.word(&word).map(|w| w.status) {
        Some(WordStatus::Unknown) => Ok(()),
        other => Err(format!("expected UNKNOWN, got {:?}", other)),
    }
}

async fn repeated_interaction_is_idempotent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let story = request_or_get(&s, "owner-1").await?;
    let word = first_daily_word(&story)?;
    for _ in 0..2 {
        s.submit_word_interaction("owner-1", &word, WireStatus::PartiallyKnown)
            .await
            .map_err(|e| e.to_string())?;
    }
    let after = s
        .get_today_story("owner-1")
        .await
        .map_err(|e| e.to_string())?;
    let changed: Vec<&str> = after
        .words
        .iter()
        .zip(story.words.iter())
        .filter(|(a, b)| a.word != word && a.status != b.status)
        .map(|(a, _)| a.word.as_str())
        .collect();
    if !changed.is_empty() {
        return Err(format!("unrelated words changed status: {:?}", changed));
    }
    match after.word(&word).map(|w| w.status) {
        Some(WordStatus::PartiallyKnown) => Ok(()),
        other => Err(format!("expected PARTIALLY_KNOWN, got {:?}", other)),
    }
}

async fn interaction_does_not_complete_story<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let story = request_or_get(&s, "owner-1").await?;
    let words: Vec<String> = story.daily_words().map(|w| w.word.clone()).collect();
    for word in &words {
        s.submit_word_interaction("owner-1", word, WireStatus::Known)
            .await
            .map_err(|e| e.to_string())?;
    }
    let after = s
        .get_today_story("owner-1")
        .await
        .map_err(|e| e.to_string())?;
    if after.is_completed {
        return Err("word interactions must never mark the story completed".to_string());
    }
    Ok(())
}
