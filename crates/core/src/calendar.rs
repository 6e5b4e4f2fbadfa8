//! Year calendar read model.
//!
//! A [`CalendarView`] always has twelve months and every day of each month,
//! whether or not the learner had a story that day. There are exactly two
//! ways to build one:
//!
//! - [`from_summary`] maps a store-side pre-aggregated [`CalendarSummary`]
//! - [`derive_from_stories`] scans raw [`StoryRecord`]s and computes each
//!   day's progress locally
//!
//! Fed equivalent data, both produce the same view, so consumers never need
//! to know which source was used.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

use crate::progress::compute_progress;
use crate::story::StoryRecord;

// ──────────────────────────────────────────────
// View types
// ──────────────────────────────────────────────

/// The story snapshot embedded in a calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStory {
    pub id: String,
    pub title: String,
    pub is_completed: bool,
    pub total_words: u32,
    pub learned_words: u32,
    pub progress_percentage: u8,
}

impl DayStory {
    /// Snapshot a story. `learned_words` counts daily words marked `Known`.
    pub fn from_story(story: &StoryRecord) -> Self {
        let stats = compute_progress(story);
        DayStory {
            id: story.id.clone(),
            title: story.title.clone(),
            is_completed: story.is_completed,
            total_words: stats.total_words,
            learned_words: stats.known_count,
            progress_percentage: stats.progress_percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub day: u8,
    pub has_story: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<DayStory>,
}

impl CalendarDay {
    fn empty(day: u8) -> Self {
        CalendarDay {
            day,
            has_story: false,
            story: None,
        }
    }

    fn set_story(&mut self, story: DayStory) {
        self.has_story = true;
        self.story = Some(story);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub month: u8,
    pub days: Vec<CalendarDay>,
}

impl CalendarMonth {
    /// Days with a story.
    pub fn story_days(&self) -> usize {
        self.days.iter().filter(|d| d.has_story).count()
    }

    /// Days whose story was completed.
    pub fn completed_days(&self) -> usize {
        self.days
            .iter()
            .filter_map(|d| d.story.as_ref())
            .filter(|s| s.is_completed)
            .count()
    }

    /// Mean progress over days with a story, rounded half-up; 0 if none.
    pub fn average_progress(&self) -> u8 {
        let (sum, count) = self
            .days
            .iter()
            .filter_map(|d| d.story.as_ref())
            .fold((0u32, 0u32), |(sum, count), s| {
                (sum + u32::from(s.progress_percentage), count + 1)
            });
        if count == 0 {
            return 0;
        }
        ((2 * sum + count) / (2 * count)).min(100) as u8
    }

    pub fn day(&self, day: u8) -> Option<&CalendarDay> {
        self.days.iter().find(|d| d.day == day)
    }

    fn day_mut(&mut self, day: u8) -> Option<&mut CalendarDay> {
        self.days.iter_mut().find(|d| d.day == day)
    }
}

/// An owner- and year-scoped calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarView {
    pub year: i32,
    pub calendar: Vec<CalendarMonth>,
}

impl CalendarView {
    /// Twelve months, every day present, no stories.
    pub fn empty(year: i32) -> Self {
        let calendar = (1..=12u8)
            .map(|month| CalendarMonth {
                month,
                days: (1..=days_in_month(year, month))
                    .map(CalendarDay::empty)
                    .collect(),
            })
            .collect();
        CalendarView { year, calendar }
    }

    pub fn month(&self, month: u8) -> Option<&CalendarMonth> {
        self.calendar.iter().find(|m| m.month == month)
    }

    pub fn day(&self, month: u8, day: u8) -> Option<&CalendarDay> {
        self.month(month).and_then(|m| m.day(day))
    }

    /// Days with a story across the whole year.
    pub fn story_days(&self) -> usize {
        self.calendar.iter().map(CalendarMonth::story_days).sum()
    }

    pub fn completed_days(&self) -> usize {
        self.calendar.iter().map(CalendarMonth::completed_days).sum()
    }

    fn day_mut(&mut self, month: u8, day: u8) -> Option<&mut CalendarDay> {
        self.calendar
            .iter_mut()
            .find(|m| m.month == month)
            .and_then(|m| m.day_mut(day))
    }
}

fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if time::util::is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

// ──────────────────────────────────────────────
// Pre-aggregated summary (store shape)
// ──────────────────────────────────────────────

/// A store-side per-year summary. Months and days may be sparse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSummary {
    pub year: i32,
    #[serde(default)]
    pub calendar: Vec<SummaryMonth>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryMonth {
    pub month: u8,
    #[serde(default)]
    pub days: Vec<SummaryDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDay {
    pub day: u8,
    #[serde(default)]
    pub has_story: bool,
    #[serde(default)]
    pub story: Option<DayStory>,
}

impl CalendarSummary {
    /// Build the summary a store would serve for these stories. Only days
    /// with a story are listed.
    pub fn from_stories(owner_id: &str, year: i32, stories: &[StoryRecord]) -> Self {
        let view = derive_from_stories(owner_id, year, stories);
        let calendar = view
            .calendar
            .into_iter()
            .filter(|m| m.story_days() > 0)
            .map(|m| SummaryMonth {
                month: m.month,
                days: m
                    .days
                    .into_iter()
                    .filter(|d| d.has_story)
                    .map(|d| SummaryDay {
                        day: d.day,
                        has_story: true,
                        story: d.story,
                    })
                    .collect(),
            })
            .collect();
        CalendarSummary { year, calendar }
    }
}

// ──────────────────────────────────────────────
// Adapters
// ──────────────────────────────────────────────

/// Map a pre-aggregated summary onto the full calendar grid.
///
/// A day counts as having a story only when the summary embeds its
/// snapshot. Out-of-range months and days are dropped.
pub fn from_summary(summary: &CalendarSummary) -> CalendarView {
    let mut view = CalendarView::empty(summary.year);
    for month in &summary.calendar {
        for day in &month.days {
            let Some(story) = &day.story else {
                if day.has_story {
                    tracing::debug!(
                        year = summary.year,
                        month = month.month,
                        day = day.day,
                        "summary day flagged hasStory without a story snapshot"
                    );
                }
                continue;
            };
            match view.day_mut(month.month, day.day) {
                Some(slot) => slot.set_story(clamped(summary.year, month.month, day.day, story)),
                None => tracing::warn!(
                    year = summary.year,
                    month = month.month,
                    day = day.day,
                    "summary day outside calendar range, dropped"
                ),
            }
        }
    }
    view
}

/// Derive the calendar from raw story records.
///
/// Records belonging to other owners or other years are ignored. If the
/// store ever returns two records for one day, the completed one wins, then
/// the most recently updated.
pub fn derive_from_stories(owner_id: &str, year: i32, stories: &[StoryRecord]) -> CalendarView {
    let mut by_day: BTreeMap<Date, &StoryRecord> = BTreeMap::new();
    for story in stories
        .iter()
        .filter(|s| s.owner_id == owner_id && s.date.year() == year)
    {
        match by_day.get(&story.date) {
            Some(existing) => {
                tracing::warn!(
                    owner_id,
                    date = %story.date,
                    kept = %existing.id,
                    other = %story.id,
                    "duplicate stories for one day"
                );
                if prefer(story, existing) {
                    by_day.insert(story.date, story);
                }
            }
            None => {
                by_day.insert(story.date, story);
            }
        }
    }

    let mut view = CalendarView::empty(year);
    for (date, story) in by_day {
        if let Some(slot) = view.day_mut(u8::from(date.month()), date.day()) {
            slot.set_story(DayStory::from_story(story));
        }
    }
    view
}

/// Keep summary snapshots inside the invariants the derived path
/// guarantees: percentage at most 100, learned words at most total words.
fn clamped(year: i32, month: u8, day: u8, story: &DayStory) -> DayStory {
    let mut story = story.clone();
    if story.progress_percentage > 100 || story.learned_words > story.total_words {
        tracing::warn!(
            year,
            month,
            day,
            story_id = %story.id,
            progress_percentage = story.progress_percentage,
            learned_words = story.learned_words,
            total_words = story.total_words,
            "summary snapshot out of range, clamped"
        );
        story.progress_percentage = story.progress_percentage.min(100);
        story.learned_words = story.learned_words.min(story.total_words);
    }
    story
}

fn prefer(candidate: &StoryRecord, existing: &StoryRecord) -> bool {
    match (candidate.is_completed, existing.is_completed) {
        (true, false) => true,
        (false, true) => false,
        _ => match (
            parse_timestamp(&candidate.updated_at),
            parse_timestamp(&existing.updated_at),
        ) {
            (Some(c), Some(e)) => c > e,
            _ => candidate.updated_at > existing.updated_at,
        },
    }
}

fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}

/// The `(month, day)` of a date, as used to index a [`CalendarView`].
pub fn month_day(date: Date) -> (u8, u8) {
    (u8::from(date.month()), date.day())
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::WordStatus;
    use crate::story::WordEntry;
    use time::macros::date;

    fn story(owner: &str, id: &str, date: Date, statuses: &[WordStatus]) -> StoryRecord {
        StoryRecord {
            id: id.to_string(),
            owner_id: owner.to_string(),
            date,
            title: format!("Story {id}"),
            body: String::new(),
            translation: String::new(),
            words: statuses
                .iter()
                .enumerate()
                .map(|(i, s)| WordEntry::daily(&format!("w{i}"), "m").with_status(*s))
                .collect(),
            is_completed: false,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn empty_view_has_full_grid() {
        let view = CalendarView::empty(2024);
        assert_eq!(view.calendar.len(), 12);
        assert_eq!(view.month(2).unwrap().days.len(), 29);
        assert_eq!(view.month(4).unwrap().days.len(), 30);
        assert_eq!(view.month(12).unwrap().days.len(), 31);
        assert_eq!(CalendarView::empty(2026).month(2).unwrap().days.len(), 28);
        assert_eq!(view.story_days(), 0);
    }

    #[test]
    fn day_without_story_is_not_an_error() {
        let view = derive_from_stories("u1", 2026, &[]);
        let day = view.day(3, 14).unwrap();
        assert!(!day.has_story);
        assert!(day.story.is_none());
        let json = serde_json::to_value(day).unwrap();
        assert_eq!(json, serde_json::json!({"day": 14, "hasStory": false}));
    }

    #[test]
    fn derive_computes_progress_per_day() {
        let mut done = story(
            "u1",
            "a",
            date!(2026 - 03 - 14),
            &[WordStatus::Known, WordStatus::Known, WordStatus::PartiallyKnown],
        );
        done.is_completed = true;
        let partial = story("u1", "b", date!(2026 - 03 - 15), &[WordStatus::Unknown]);
        let view = derive_from_stories("u1", 2026, &[done, partial]);

        let day = view.day(3, 14).unwrap().story.as_ref().unwrap();
        assert_eq!(day.id, "a");
        assert!(day.is_completed);
        assert_eq!(day.total_words, 3);
        assert_eq!(day.learned_words, 2);
        assert_eq!(day.progress_percentage, 83);

        let march = view.month(3).unwrap();
        assert_eq!(march.story_days(), 2);
        assert_eq!(march.completed_days(), 1);
        assert_eq!(march.average_progress(), 42);
    }

    #[test]
    fn derive_scopes_by_owner_and_year() {
        let stories = vec![
            story("u1", "mine", date!(2026 - 05 - 01), &[]),
            story("u2", "theirs", date!(2026 - 05 - 02), &[]),
            story("u1", "last-year", date!(2025 - 05 - 03), &[]),
        ];
        let view = derive_from_stories("u1", 2026, &stories);
        assert_eq!(view.story_days(), 1);
        assert!(view.day(5, 1).unwrap().has_story);

        let last_year = derive_from_stories("u1", 2025, &stories);
        assert_eq!(last_year.story_days(), 1);
        assert!(last_year.day(5, 3).unwrap().has_story);
        assert!(!last_year.day(5, 1).unwrap().has_story);
    }

    #[test]
    fn duplicate_day_prefers_completed_then_latest() {
        let mut older = story("u1", "older", date!(2026 - 06 - 01), &[]);
        older.updated_at = "2026-06-01T08:00:00Z".to_string();
        let mut newer = story("u1", "newer", date!(2026 - 06 - 01), &[]);
        newer.updated_at = "2026-06-01T09:00:00Z".to_string();
        let view = derive_from_stories("u1", 2026, &[older.clone(), newer.clone()]);
        assert_eq!(view.day(6, 1).unwrap().story.as_ref().unwrap().id, "newer");

        older.is_completed = true;
        let view = derive_from_stories("u1", 2026, &[older, newer]);
        assert_eq!(view.day(6, 1).unwrap().story.as_ref().unwrap().id, "older");
    }

    #[test]
    fn duplicate_day_compares_instants_across_offsets() {
        // 09:30+02:00 is 07:30Z, earlier than 08:00Z despite sorting later.
        let mut east = story("u1", "east", date!(2026 - 06 - 01), &[]);
        east.updated_at = "2026-06-01T09:30:00+02:00".to_string();
        let mut utc = story("u1", "utc", date!(2026 - 06 - 01), &[]);
        utc.updated_at = "2026-06-01T08:00:00Z".to_string();

        let view = derive_from_stories("u1", 2026, &[east.clone(), utc.clone()]);
        assert_eq!(view.day(6, 1).unwrap().story.as_ref().unwrap().id, "utc");
        let view = derive_from_stories("u1", 2026, &[utc, east]);
        assert_eq!(view.day(6, 1).unwrap().story.as_ref().unwrap().id, "utc");
    }

    #[test]
    fn duplicate_day_with_unparseable_timestamp_falls_back_to_text() {
        let mut a = story("u1", "a", date!(2026 - 06 - 01), &[]);
        a.updated_at = "b".to_string();
        let mut b = story("u1", "b", date!(2026 - 06 - 01), &[]);
        b.updated_at = "a".to_string();
        let view = derive_from_stories("u1", 2026, &[b, a]);
        assert_eq!(view.day(6, 1).unwrap().story.as_ref().unwrap().id, "a");
    }

    #[test]
    fn summary_snapshot_out_of_range_is_clamped() {
        let summary = CalendarSummary {
            year: 2026,
            calendar: vec![SummaryMonth {
                month: 8,
                days: vec![SummaryDay {
                    day: 12,
                    has_story: true,
                    story: Some(DayStory {
                        id: "bad".to_string(),
                        title: "bad".to_string(),
                        is_completed: false,
                        total_words: 3,
                        learned_words: 7,
                        progress_percentage: 180,
                    }),
                }],
            }],
        };
        let view = from_summary(&summary);
        let day = view.day(8, 12).unwrap().story.as_ref().unwrap();
        assert_eq!(day.progress_percentage, 100);
        assert_eq!(day.learned_words, 3);
        assert_eq!(day.total_words, 3);
        assert!(view.month(8).unwrap().average_progress() <= 100);
    }

    #[test]
    fn summary_and_derived_paths_agree() {
        let mut first = story(
            "u1",
            "a",
            date!(2026 - 01 - 31),
            &[WordStatus::Known, WordStatus::Unknown],
        );
        first.is_completed = true;
        let stories = vec![
            first,
            story("u1", "b", date!(2026 - 02 - 28), &[WordStatus::PartiallyKnown]),
            story("u1", "c", date!(2026 - 12 - 25), &[]),
        ];
        let derived = derive_from_stories("u1", 2026, &stories);
        let summary = CalendarSummary::from_stories("u1", 2026, &stories);
        assert_eq!(from_summary(&summary), derived);
    }

    #[test]
    fn summary_out_of_range_days_dropped() {
        let snapshot = DayStory {
            id: "x".to_string(),
            title: "x".to_string(),
            is_completed: false,
            total_words: 0,
            learned_words: 0,
            progress_percentage: 0,
        };
        let summary = CalendarSummary {
            year: 2026,
            calendar: vec![
                SummaryMonth {
                    month: 2,
                    days: vec![SummaryDay {
                        day: 30,
                        has_story: true,
                        story: Some(snapshot.clone()),
                    }],
                },
                SummaryMonth {
                    month: 13,
                    days: vec![SummaryDay {
                        day: 1,
                        has_story: true,
                        story: Some(snapshot),
                    }],
                },
            ],
        };
        assert_eq!(from_summary(&summary), CalendarView::empty(2026));
    }

    #[test]
    fn summary_flag_without_snapshot_is_no_story() {
        let summary = CalendarSummary {
            year: 2026,
            calendar: vec![SummaryMonth {
                month: 7,
                days: vec![SummaryDay {
                    day: 4,
                    has_story: true,
                    story: None,
                }],
            }],
        };
        assert!(!from_summary(&summary).day(7, 4).unwrap().has_story);
    }

    #[test]
    fn summary_deserializes_store_shape() {
        let json = serde_json::json!({
            "year": 2026,
            "calendar": [{
                "month": 3,
                "days": [{
                    "day": 14,
                    "hasStory": true,
                    "story": {
                        "id": "s1",
                        "title": "Market",
                        "isCompleted": true,
                        "totalWords": 5,
                        "learnedWords": 3,
                        "progressPercentage": 70
                    }
                }]
            }]
        });
        let summary: CalendarSummary = serde_json::from_value(json).unwrap();
        let view = from_summary(&summary);
        let day = view.day(3, 14).unwrap();
        assert!(day.has_story);
        assert_eq!(day.story.as_ref().unwrap().progress_percentage, 70);
    }

    #[test]
    fn average_progress_rounds_half_up() {
        let mut month = CalendarView::empty(2026).calendar.remove(0);
        for (day, pct) in [(1u8, 50u8), (2, 75)] {
            month.days[usize::from(day) - 1].set_story(DayStory {
                id: format!("d{day}"),
                title: String::new(),
                is_completed: false,
                total_words: 4,
                learned_words: 0,
                progress_percentage: pct,
            });
        }
        // (50 + 75) / 2 = 62.5 -> 63
        assert_eq!(month.average_progress(), 63);
    }

    #[test]
    fn month_day_indexes_view() {
        assert_eq!(month_day(date!(2026 - 10 - 19)), (10, 19));
    }
}
