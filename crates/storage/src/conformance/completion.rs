use std::future::Future;

use storyday_core::WireStatus;

use super::{request_or_get, Category, TestResult};
use crate::{CompletionSubmission, StorageError, StoryStore};

pub(super) async fn run_completion_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::new(
        Category::Completion,
        "completion_marks_story_completed",
        completion_marks_story_completed(factory).await,
    ));
    results.push(TestResult::new(
        Category::Completion,
        "repeated_completion_is_noop",
        repeated_completion_is_noop(factory).await,
    ));
    results.push(TestResult::new(
        Category::Completion,
        "completion_with_wrong_story_id_rejected",
        completion_with_wrong_story_id_rejected(factory).await,
    ));
    results.push(TestResult::new(
        Category::Completion,
        "remote_gate_matches_word_statuses",
        remote_gate_matches_word_statuses(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn completion_marks_story_completed<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let story = request_or_get(&s, "owner-1").await?;
    let submission = CompletionSubmission {
        story_id: story.id.clone(),
        level: 1,
        points: 10,
    };
    let ack = s
        .submit_completion("owner-1", &submission)
        .await
        .map_err(|e| e.to_string())?;
    if !ack.newly_completed {
        return Err("first completion not acknowledged as a transition".to_string());
    }
    let after = s
        .get_today_story("owner-1")
        .await
        .map_err(|e| e.to_string())?;
    if !after.is_completed {
        return Err("story not completed after submit_completion".to_string());
    }
    Ok(())
}

/// A second completion succeeds, reports no transition and leaves the story
/// completed.
async fn repeated_completion_is_noop<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let story = request_or_get(&s, "owner-1").await?;
    let submission = CompletionSubmission {
        story_id: story.id.clone(),
        level: 1,
        points: 10,
    };
    s.submit_completion("owner-1", &submission)
        .await
        .map_err(|e| format!("first completion: {e}"))?;
    let ack = s
        .submit_completion("owner-1", &submission)
        .await
        .map_err(|e| format!("second completion: {e}"))?;
    if ack.newly_completed {
        return Err("second completion reported a new transition".to_string());
    }
    let after = s
        .get_today_story("owner-1")
        .await
        .map_err(|e| e.to_string())?;
    if !after.is_completed || after.id != story.id {
        return Err("repeated completion changed the story".to_string());
    }
    Ok(())
}

async fn completion_with_wrong_story_id_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    request_or_get(&s, "owner-1").await?;
    let submission = CompletionSubmission {
        story_id: "not-a-story".to_string(),
        level: 1,
        points: 10,
    };
    match s.submit_completion("owner-1", &submission).await {
        Err(StorageError::StoryMismatch { story_id, .. }) => {
            if story_id != "not-a-story" {
                return Err(format!("StoryMismatch names the wrong id: {story_id}"));
            }
        }
        other => return Err(format!("expected StoryMismatch, got {:?}", other)),
    }
    let after = s
        .get_today_story("owner-1")
        .await
        .map_err(|e| e.to_string())?;
    if after.is_completed {
        return Err("rejected completion still completed the story".to_string());
    }
    Ok(())
}

/// If the store serves a gate, it agrees with the word statuses it holds.
async fn remote_gate_matches_word_statuses<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let story = request_or_get(&s, "owner-1").await?;
    let words: Vec<String> = story.daily_words().map(|w| w.word.clone()).collect();
    let total = words.len() as u32;

    let Some(before) = s.get_can_proceed("owner-1").await.map_err(|e| e.to_string())? else {
        return Ok(());
    };
    if before.total_daily_words != total {
        return Err(format!(
            "gate reports {} daily words, story has {}",
            before.total_daily_words, total
        ));
    }
    if before.can_proceed || before.daily_words_completed != 0 {
        return Err(format!("fresh story gate should be closed at 0, got {before:?}"));
    }

    for word in &words {
        s.submit_word_interaction("owner-1", word, WireStatus::PartiallyKnown)
            .await
            .map_err(|e| e.to_string())?;
    }
    let after = s
        .get_can_proceed("owner-1")
        .await
        .map_err(|e| e.to_string())?
        .ok_or("store stopped serving the gate")?;
    if !after.can_proceed || after.daily_words_completed != total {
        return Err(format!("gate should be open after reviewing all words, got {after:?}"));
    }
    Ok(())
}
