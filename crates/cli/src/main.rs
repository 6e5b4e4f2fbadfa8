mod offline;
mod online;
mod render;

use std::path::PathBuf;
use std::process;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use storyday_workflow::StorydayConfig;
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Daily reading stories: word mastery, completion and calendar.
#[derive(Parser)]
#[command(
    name = "storyday",
    version,
    about = "Daily reading stories: word mastery, completion and calendar"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a storyday.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show progress statistics for a story JSON file
    Progress {
        /// Path to the story JSON file
        story: PathBuf,
    },

    /// Evaluate the completion gate for a story JSON file (exits 1 when blocked)
    Gate {
        /// Path to the story JSON file
        story: PathBuf,
    },

    /// Build a year calendar from a story list or a pre-aggregated summary
    #[command(group(ArgGroup::new("input").required(true).args(["stories", "summary"])))]
    Calendar {
        /// Calendar year
        #[arg(long)]
        year: i32,
        /// JSON array of story records
        #[arg(long)]
        stories: Option<PathBuf>,
        /// JSON calendar summary
        #[arg(long)]
        summary: Option<PathBuf>,
        /// Owner whose stories to include (defaults to the only owner present)
        #[arg(long, requires = "stories")]
        owner: Option<String>,
    },

    /// Show today's story from the store, requesting it if needed
    Today {
        /// Owner ID
        #[arg(long)]
        owner: String,
    },

    /// Record a word interaction on today's story
    Interact {
        /// Owner ID
        #[arg(long)]
        owner: String,
        /// The word interacted with
        #[arg(long)]
        word: String,
        /// Observed status: UNKNOWN, PARTIALLY_KNOWN, KNOWN or NOT_LEARNED
        #[arg(long)]
        status: String,
    },

    /// Complete today's story
    Complete {
        /// Owner ID
        #[arg(long)]
        owner: String,
        /// Level reached
        #[arg(long, default_value_t = 1)]
        level: u32,
        /// Points awarded
        #[arg(long, default_value_t = 0)]
        points: u32,
    },

    /// Build the owner's calendar from the store
    RemoteCalendar {
        /// Owner ID
        #[arg(long)]
        owner: String,
        /// Calendar year
        #[arg(long)]
        year: i32,
    },

    /// Fetch calendar, today's story and remaining requests in one go
    Dashboard {
        /// Owner ID
        #[arg(long)]
        owner: String,
        /// Calendar year
        #[arg(long)]
        year: i32,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match StorydayConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            report_error(&e.to_string(), cli.output, cli.quiet);
            process::exit(1);
        }
    };
    init_tracing(&config.log.filter);

    match cli.command {
        Commands::Progress { story } => {
            offline::cmd_progress(&story, cli.output, cli.quiet);
        }
        Commands::Gate { story } => {
            offline::cmd_gate(&story, cli.output, cli.quiet);
        }
        Commands::Calendar {
            year,
            stories,
            summary,
            owner,
        } => {
            offline::cmd_calendar(
                year,
                stories.as_deref(),
                summary.as_deref(),
                owner.as_deref(),
                cli.output,
                cli.quiet,
            );
        }
        Commands::Today { owner } => {
            online::cmd_today(&config, &owner, cli.output, cli.quiet);
        }
        Commands::Interact {
            owner,
            word,
            status,
        } => {
            online::cmd_interact(&config, &owner, &word, &status, cli.output, cli.quiet);
        }
        Commands::Complete {
            owner,
            level,
            points,
        } => {
            online::cmd_complete(&config, &owner, level, points, cli.output, cli.quiet);
        }
        Commands::RemoteCalendar { owner, year } => {
            online::cmd_remote_calendar(&config, &owner, year, cli.output, cli.quiet);
        }
        Commands::Dashboard { owner, year } => {
            online::cmd_dashboard(&config, &owner, year, cli.output, cli.quiet);
        }
    }
}

/// Logs go to stderr; `RUST_LOG` wins over the configured filter.
fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Print a JSON value to stdout, pretty.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("error: could not serialize output: {}", e),
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
