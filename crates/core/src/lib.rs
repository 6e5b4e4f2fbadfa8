//! storyday-core: the pure rules behind daily reading stories.
//!
//! Everything in this crate is synchronous and side-effect free. The
//! I/O-bound orchestration (fetching stories, submitting interactions,
//! emitting completion events) lives in `storyday-workflow`.
//!
//! # Public API
//!
//! - [`WireStatus`] / [`WordStatus`] -- the four-value upstream vocabulary
//!   and the three-value canonical status it normalizes into
//! - [`WordEntry`] / [`StoryRecord`] -- one day's story and its words
//! - [`apply_interaction`] -- the word-mastery transition
//! - [`compute_progress`] -- derived per-story statistics
//! - [`can_proceed`] -- the story-completion gate
//! - [`CalendarView`] and its two adapters, [`from_summary`] and
//!   [`derive_from_stories`]

pub mod calendar;
pub mod error;
pub mod gating;
pub mod mastery;
pub mod progress;
pub mod status;
pub mod story;

// ── Convenience re-exports ───────────────────────────────────────────

pub use calendar::{
    derive_from_stories, from_summary, CalendarDay, CalendarMonth, CalendarSummary, CalendarView,
    DayStory, SummaryDay, SummaryMonth,
};
pub use error::CoreError;
pub use gating::{can_proceed, GateDecision};
pub use mastery::{apply_interaction, apply_raw_interaction};
pub use progress::{compute_progress, ProgressStats};
pub use status::{WireStatus, WordStatus};
pub use story::{StoryRecord, WordEntry};
