//! Commands that work on local JSON files, no store involved.

use std::collections::BTreeSet;
use std::path::Path;
use std::process;

use serde::de::DeserializeOwned;
use storyday_core::{
    can_proceed, compute_progress, derive_from_stories, from_summary, CalendarSummary,
    StoryRecord,
};

use crate::render;
use crate::{print_json, report_error, OutputFormat};

/// Read and parse a JSON file, exiting with a message on failure.
fn read_json<T: DeserializeOwned>(path: &Path, output: OutputFormat, quiet: bool) -> T {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            report_error(
                &format!("could not read '{}': {}", path.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            report_error(
                &format!("could not parse '{}': {}", path.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    }
}

pub(crate) fn cmd_progress(story_path: &Path, output: OutputFormat, quiet: bool) {
    let story: StoryRecord = read_json(story_path, output, quiet);
    let stats = compute_progress(&story);
    match output {
        OutputFormat::Json => print_json(&stats),
        OutputFormat::Text => {
            if !quiet {
                println!("{}", render::story_header(&story));
            }
            println!("{}", render::progress_line(&stats));
        }
    }
}

pub(crate) fn cmd_gate(story_path: &Path, output: OutputFormat, quiet: bool) {
    let story: StoryRecord = read_json(story_path, output, quiet);
    let decision = can_proceed(&story);
    match output {
        OutputFormat::Json => print_json(&decision),
        OutputFormat::Text => println!("{}", render::gate_line(&decision)),
    }
    if !decision.allowed {
        process::exit(1);
    }
}

pub(crate) fn cmd_calendar(
    year: i32,
    stories: Option<&Path>,
    summary: Option<&Path>,
    owner: Option<&str>,
    output: OutputFormat,
    quiet: bool,
) {
    let view = match (stories, summary) {
        (Some(path), _) => {
            let stories: Vec<StoryRecord> = read_json(path, output, quiet);
            let owner = match owner {
                Some(o) => o.to_string(),
                None => match single_owner(&stories) {
                    Ok(o) => o,
                    Err(msg) => {
                        report_error(&msg, output, quiet);
                        process::exit(1);
                    }
                },
            };
            derive_from_stories(&owner, year, &stories)
        }
        (None, Some(path)) => {
            let summary: CalendarSummary = read_json(path, output, quiet);
            if summary.year != year {
                report_error(
                    &format!(
                        "summary '{}' is for {}, not {}",
                        path.display(),
                        summary.year,
                        year
                    ),
                    output,
                    quiet,
                );
                process::exit(1);
            }
            from_summary(&summary)
        }
        (None, None) => {
            report_error("one of --stories or --summary is required", output, quiet);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => print_json(&view),
        OutputFormat::Text => print!("{}", render::calendar(&view, quiet)),
    }
}

/// The owner shared by every story, if there is exactly one. An empty list
/// has no owner to filter on, so any name works.
fn single_owner(stories: &[StoryRecord]) -> Result<String, String> {
    let owners: BTreeSet<&str> = stories.iter().map(|s| s.owner_id.as_str()).collect();
    match owners.len() {
        0 => Ok(String::new()),
        1 => Ok(owners.into_iter().next().unwrap_or_default().to_string()),
        _ => Err(format!(
            "stories belong to several owners ({}); pass --owner",
            owners.into_iter().collect::<Vec<_>>().join(", ")
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyday_core::WordEntry;
    use time::macros::date;

    fn story(owner: &str) -> StoryRecord {
        StoryRecord {
            id: format!("{owner}-1"),
            owner_id: owner.to_string(),
            date: date!(2026 - 01 - 05),
            title: "t".to_string(),
            body: String::new(),
            translation: String::new(),
            words: vec![WordEntry::daily("a", "a")],
            is_completed: false,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn single_owner_found() {
        assert_eq!(single_owner(&[story("u1"), story("u1")]).unwrap(), "u1");
    }

    #[test]
    fn several_owners_rejected() {
        let err = single_owner(&[story("u1"), story("u2")]).unwrap_err();
        assert!(err.contains("u1, u2"));
    }

    #[test]
    fn no_stories_is_fine() {
        assert_eq!(single_owner(&[]).unwrap(), "");
    }
}
