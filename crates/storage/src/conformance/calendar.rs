use std::future::Future;

use storyday_core::calendar::month_day;
use storyday_core::{derive_from_stories, from_summary, WireStatus};

use super::{first_daily_word, request_or_get, Category, TestResult};
use crate::StoryStore;

pub(super) async fn run_calendar_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::new(
        Category::Calendar,
        "list_stories_includes_today",
        list_stories_includes_today(factory).await,
    ));
    results.push(TestResult::new(
        Category::Calendar,
        "list_stories_scoped_by_year",
        list_stories_scoped_by_year(factory).await,
    ));
    results.push(TestResult::new(
        Category::Calendar,
        "list_stories_scoped_by_owner",
        list_stories_scoped_by_owner(factory).await,
    ));
    results.push(TestResult::new(
        Category::Calendar,
        "summary_agrees_with_listed_stories",
        summary_agrees_with_listed_stories(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn list_stories_includes_today<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let story = request_or_get(&s, "owner-1").await?;
    let listed = s
        .list_stories("owner-1", story.date.year())
        .await
        .map_err(|e| e.to_string())?;
    if !listed.iter().any(|l| l.id == story.id) {
        return Err(format!("story {} missing from list_stories", story.id));
    }
    Ok(())
}

async fn list_stories_scoped_by_year<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let story = request_or_get(&s, "owner-1").await?;
    let other_year = story.date.year() - 1;
    let listed = s
        .list_stories("owner-1", other_year)
        .await
        .map_err(|e| e.to_string())?;
    if let Some(stray) = listed.iter().find(|l| l.date.year() != other_year) {
        return Err(format!(
            "list_stories({other_year}) returned story {} dated {}",
            stray.id, stray.date
        ));
    }
    Ok(())
}

async fn list_stories_scoped_by_owner<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: StoryStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let story = request_or_get(&s, "owner-1").await?;
    let listed = s
        .list_stories("owner-2", story.date.year())
        .await
        .map_err(|e| e.to_string())?;
    if !listed.is_empty() {
        return Err(format!(
            "owner-2 sees {} stories it never requested",
            listed.len()
        ));
    }
    Ok(())
}

/// When a summary is served, mapping it gives the same view as deriving one
/// from the listed stories.
async fn summary_agrees_with_listed_stories<S, F, Fut>(factory: &F) -> Result<(), String>
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

    let year = story.date.year();
    let Some(summary) = s
        .get_calendar_summary("owner-1", year)
        .await
        .map_err(|e| e.to_string())?
    else {
        return Ok(());
    };
    let listed = s
        .list_stories("owner-1", year)
        .await
        .map_err(|e| e.to_string())?;

    let mapped = from_summary(&summary);
    let derived = derive_from_stories("owner-1", year, &listed);
    if mapped != derived {
        return Err("summary view differs from the view derived from list_stories".to_string());
    }

    let (month, day) = month_day(story.date);
    let today = mapped
        .day(month, day)
        .ok_or_else(|| format!("calendar has no slot for {}", story.date))?;
    if !today.has_story {
        return Err(format!("summary does not mark {} as a story day", story.date));
    }
    Ok(())
}
