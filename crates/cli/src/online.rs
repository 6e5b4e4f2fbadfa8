//! Commands that talk to the HTTP story store.

use std::process;
use std::sync::Arc;

use serde_json::json;
use storyday_workflow::{
    fetch_dashboard, CalendarAggregator, CalendarOutcome, CompletionOutcome, CompletionWorkflow,
    DayState, HttpStore, StorydayConfig, TracingSink, ViewSource, WorkflowError,
};
use time::{Date, OffsetDateTime};
use tokio::runtime::Runtime;

use crate::render;
use crate::{print_json, report_error, OutputFormat};

// ── Setup ────────────────────────────────────────────────────────────────────

fn fail(err: &WorkflowError, output: OutputFormat, quiet: bool) -> ! {
    report_error(&err.to_string(), output, quiet);
    process::exit(1);
}

fn runtime(output: OutputFormat, quiet: bool) -> Runtime {
    match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("failed to create tokio runtime: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

fn connect(config: &StorydayConfig, output: OutputFormat, quiet: bool) -> Arc<HttpStore> {
    match HttpStore::from_config(config) {
        Ok(store) => Arc::new(store),
        Err(e) => fail(&e, output, quiet),
    }
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

fn workflow(
    config: &StorydayConfig,
    owner: &str,
    output: OutputFormat,
    quiet: bool,
) -> CompletionWorkflow<HttpStore> {
    let store = connect(config, output, quiet);
    CompletionWorkflow::new(
        store,
        Arc::new(TracingSink),
        owner,
        today(),
        config.retry_policy(),
    )
}

fn source_label(source: ViewSource) -> &'static str {
    match source {
        ViewSource::Summary => "summary",
        ViewSource::Derived { degraded: false } => "derived",
        ViewSource::Derived { degraded: true } => "derived, summary failed",
    }
}

// ── Commands ─────────────────────────────────────────────────────────────────

pub(crate) fn cmd_today(config: &StorydayConfig, owner: &str, output: OutputFormat, quiet: bool) {
    let mut wf = workflow(config, owner, output, quiet);
    let rt = runtime(output, quiet);

    let result = rt.block_on(async {
        if wf.refresh().await? == DayState::NoStoryToday {
            wf.request_story().await?;
        }
        Ok::<_, WorkflowError>(())
    });
    if let Err(e) = result {
        fail(&e, output, quiet);
    }

    match output {
        OutputFormat::Json => print_json(&json!({
            "state": wf.state(),
            "story": wf.story(),
            "progress": wf.progress(),
            "gate": wf.local_gate(),
        })),
        OutputFormat::Text => {
            if let Some(story) = wf.story() {
                println!("{}", render::story_header(story));
                if !quiet {
                    print!("{}", render::word_lines(story));
                }
            }
            if let Some(stats) = wf.progress() {
                println!("{}", render::progress_line(&stats));
            }
            println!("{}", render::gate_line(&wf.local_gate()));
        }
    }
}

pub(crate) fn cmd_interact(
    config: &StorydayConfig,
    owner: &str,
    word: &str,
    status: &str,
    output: OutputFormat,
    quiet: bool,
) {
    let mut wf = workflow(config, owner, output, quiet);
    let rt = runtime(output, quiet);

    let result = rt.block_on(async {
        wf.refresh().await?;
        wf.interact_raw(word, status).await
    });
    let entry = match result {
        Ok(entry) => entry,
        Err(e) => fail(&e, output, quiet),
    };

    match output {
        OutputFormat::Json => print_json(&json!({
            "word": entry,
            "state": wf.state(),
            "progress": wf.progress(),
            "gate": wf.local_gate(),
        })),
        OutputFormat::Text => {
            println!("{}: {}", entry.word, entry.status);
            if let Some(stats) = wf.progress() {
                println!("{}", render::progress_line(&stats));
            }
            if !quiet {
                println!("{}", render::gate_line(&wf.local_gate()));
            }
        }
    }
}

pub(crate) fn cmd_complete(
    config: &StorydayConfig,
    owner: &str,
    level: u32,
    points: u32,
    output: OutputFormat,
    quiet: bool,
) {
    let mut wf = workflow(config, owner, output, quiet);
    let rt = runtime(output, quiet);

    let result = rt.block_on(async {
        wf.refresh().await?;
        wf.complete(level, points).await
    });
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => fail(&e, output, quiet),
    };

    match (output, outcome) {
        (OutputFormat::Json, CompletionOutcome::Completed(event)) => {
            print_json(&json!({ "outcome": "completed", "event": event }))
        }
        (OutputFormat::Json, CompletionOutcome::AlreadyCompleted) => {
            print_json(&json!({ "outcome": "already_completed" }))
        }
        (OutputFormat::Text, CompletionOutcome::Completed(event)) => println!(
            "story {} completed: level {}, {} points",
            event.story_id, event.level, event.points
        ),
        (OutputFormat::Text, CompletionOutcome::AlreadyCompleted) => {
            println!("story already completed")
        }
    }
}

pub(crate) fn cmd_remote_calendar(
    config: &StorydayConfig,
    owner: &str,
    year: i32,
    output: OutputFormat,
    quiet: bool,
) {
    let store = connect(config, output, quiet);
    let rt = runtime(output, quiet);
    let aggregator = CalendarAggregator::new(store, config.retry_policy());

    let outcome = match rt.block_on(aggregator.build_view(owner, year)) {
        Ok(outcome) => outcome,
        Err(e) => fail(&e, output, quiet),
    };

    match output {
        OutputFormat::Json => print_json(&outcome),
        OutputFormat::Text => {
            print!("{}", render::calendar(&outcome.view, quiet));
            if !quiet {
                println!("(source: {})", source_label(outcome.source));
            }
        }
    }
}

pub(crate) fn cmd_dashboard(
    config: &StorydayConfig,
    owner: &str,
    year: i32,
    output: OutputFormat,
    quiet: bool,
) {
    let store = connect(config, output, quiet);
    let rt = runtime(output, quiet);
    let dash = rt.block_on(fetch_dashboard(store, owner, year, config.retry_policy()));

    let all_failed = dash.calendar.is_err() && dash.today.is_err() && dash.remaining.is_err();

    match output {
        OutputFormat::Json => {
            let calendar = match &dash.calendar {
                Ok(outcome) => json!(outcome),
                Err(e) => json!({ "error": e.to_string() }),
            };
            let today = match &dash.today {
                Ok(story) => json!({ "story": story, "progress": dash.progress() }),
                Err(e) => json!({ "error": e.to_string() }),
            };
            let remaining = match &dash.remaining {
                Ok(r) => json!(r.remaining),
                Err(e) => json!({ "error": e.to_string() }),
            };
            print_json(&json!({
                "calendar": calendar,
                "today": today,
                "remainingRequests": remaining,
                "partial": dash.is_partial(),
            }));
        }
        OutputFormat::Text => {
            match &dash.today {
                Ok(Some(story)) => println!("today: {}", render::story_header(story)),
                Ok(None) => println!("today: no story yet"),
                Err(e) => println!("today: unavailable ({})", e),
            }
            if let Some(stats) = dash.progress() {
                println!("{}", render::progress_line(&stats));
            }
            match &dash.remaining {
                Ok(r) => println!("remaining requests: {}", r.remaining),
                Err(e) => println!("remaining requests: unavailable ({})", e),
            }
            match &dash.calendar {
                Ok(CalendarOutcome { view, source }) => {
                    print!("{}", render::calendar(view, true));
                    if !quiet {
                        println!("(source: {})", source_label(*source));
                    }
                }
                Err(e) => println!("calendar: unavailable ({})", e),
            }
        }
    }

    if all_failed {
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_labels() {
        assert_eq!(source_label(ViewSource::Summary), "summary");
        assert_eq!(source_label(ViewSource::Derived { degraded: false }), "derived");
        assert_eq!(
            source_label(ViewSource::Derived { degraded: true }),
            "derived, summary failed"
        );
    }
}
