//! Completion events for the achievements collaborator.

use serde::{Deserialize, Serialize};
use storyday_core::story::day_format;
use time::Date;
use tokio::sync::mpsc;

/// Emitted once per `(owner_id, date)` when today's story is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryCompleted {
    pub owner_id: String,
    pub story_id: String,
    #[serde(with = "day_format")]
    pub date: Date,
    pub level: u32,
    pub points: u32,
}

/// Receives completion events. Delivery is fire-and-forget: the store has
/// already recorded the completion when a sink sees the event.
pub trait CompletionSink: Send + Sync {
    fn emit(&self, event: StoryCompleted);
}

/// Forwards events into a tokio channel for a consumer task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StoryCompleted>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StoryCompleted>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelSink { tx }, rx)
    }
}

impl CompletionSink for ChannelSink {
    fn emit(&self, event: StoryCompleted) {
        if let Err(e) = self.tx.send(event) {
            tracing::warn!(
                owner_id = %e.0.owner_id,
                story_id = %e.0.story_id,
                "completion event dropped: receiver closed"
            );
        }
    }
}

/// Logs each event at `info`. Used by the CLI, where no consumer runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl CompletionSink for TracingSink {
    fn emit(&self, event: StoryCompleted) {
        tracing::info!(
            owner_id = %event.owner_id,
            story_id = %event.story_id,
            date = %event.date,
            level = event.level,
            points = event.points,
            "story completed"
        );
    }
}
