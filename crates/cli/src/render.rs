//! Text rendering for terminal output.

use std::fmt::Write;

use storyday_core::{CalendarView, GateDecision, ProgressStats, StoryRecord};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub(crate) fn story_header(story: &StoryRecord) -> String {
    let done = if story.is_completed { " [completed]" } else { "" };
    format!("{} ({}, {}){}", story.title, story.date, story.id, done)
}

pub(crate) fn progress_line(stats: &ProgressStats) -> String {
    format!(
        "progress: {}% ({} known, {} partially known, {} unknown of {} daily words)",
        stats.progress_percentage,
        stats.known_count,
        stats.partially_known_count,
        stats.unknown_count,
        stats.total_words
    )
}

pub(crate) fn gate_line(decision: &GateDecision) -> String {
    let verdict = if decision.allowed { "allowed" } else { "blocked" };
    format!("{}: {}", verdict, decision.reason)
}

/// One line per word; daily targets are starred.
pub(crate) fn word_lines(story: &StoryRecord) -> String {
    let width = story.words.iter().map(|w| w.word.len()).max().unwrap_or(0);
    let mut out = String::new();
    for w in &story.words {
        let marker = if w.is_daily_target { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "  {} {:<width$}  {:<15} {}",
            marker,
            w.word,
            w.status.as_str(),
            w.meaning,
            width = width
        );
    }
    out
}

pub(crate) fn calendar(view: &CalendarView, quiet: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "calendar {}: {} story days, {} completed",
        view.year,
        view.story_days(),
        view.completed_days()
    );
    for month in &view.calendar {
        if month.story_days() == 0 {
            continue;
        }
        let name = MONTHS
            .get(usize::from(month.month).saturating_sub(1))
            .copied()
            .unwrap_or("???");
        let _ = writeln!(
            out,
            "{}: {} story days, {} completed, average {}%",
            name,
            month.story_days(),
            month.completed_days(),
            month.average_progress()
        );
        if quiet {
            continue;
        }
        for day in month.days.iter().filter(|d| d.has_story) {
            if let Some(story) = &day.story {
                let mark = if story.is_completed { "x" } else { " " };
                let _ = writeln!(
                    out,
                    "  {:>2} [{}] {:>3}% {}",
                    day.day, mark, story.progress_percentage, story.title
                );
            }
        }
    }
    out
}
