//! storyday-workflow: the I/O-bound side of daily stories.
//!
//! - [`CompletionWorkflow`] -- the per-day state machine over a
//!   [`StoryStore`](storyday_storage::StoryStore)
//! - [`CalendarAggregator`] -- calendar views, summary first, raw stories as
//!   fallback
//! - [`fetch_dashboard`] -- concurrent calendar, story and quota fetch
//! - [`HttpStore`] -- the REST backend
//! - [`RetryPolicy`] and [`StorydayConfig`]

pub mod calendar;
pub mod completion;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod http;
pub mod retry;

pub use calendar::{CalendarAggregator, CalendarOutcome, ViewSource};
pub use completion::{CompletionOutcome, CompletionWorkflow, DayState, GateCheck, GateSource};
pub use config::StorydayConfig;
pub use dashboard::{fetch_dashboard, Dashboard};
pub use error::WorkflowError;
pub use events::{ChannelSink, CompletionSink, StoryCompleted, TracingSink};
pub use http::HttpStore;
pub use retry::RetryPolicy;
