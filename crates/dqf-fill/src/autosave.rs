//! Debounced autosave
//!
//! Every edit re-arms a fixed delay; the draft is written once the applicant
//! has paused for that long. Time is passed in so the caller owns the clock.

use std::time::{Duration, Instant};

/// What the save indicator shows. `Saving` covers the whole debounce window,
/// not just the write itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Autosaver {
    delay: Duration,
    last_edit: Option<Instant>,
    last_saved: Option<Instant>,
    status: SaveStatus,
}

impl Autosaver {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_edit: None,
            last_saved: None,
            status: SaveStatus::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn last_saved(&self) -> Option<Instant> {
        self.last_saved
    }

    /// An edit happened at `now`: restart the countdown
    pub fn note_edit(&mut self, now: Instant) {
        self.last_edit = Some(now);
        self.status = SaveStatus::Saving;
    }

    pub fn is_pending(&self) -> bool {
        self.last_edit.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.last_edit
            .is_some_and(|edit| now.saturating_duration_since(edit) >= self.delay)
    }

    pub fn mark_saved(&mut self, now: Instant) {
        self.last_edit = None;
        self.last_saved = Some(now);
        self.status = SaveStatus::Saved;
    }

    /// The write failed. Nothing is retried until the next edit.
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.last_edit = None;
        self.status = SaveStatus::Failed(reason.into());
    }
}
