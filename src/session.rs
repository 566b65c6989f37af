// src/session.rs
// Single-flow submission state machine

use crate::backend::Submission;
use crate::orchestrator::progress::ProgressTracker;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Owns the single "current submission" slot: exactly one started-at
/// timestamp, one cancellation token and one progress tracker are valid at
/// a time. Beginning a new submission raises the previous one's abort
/// signal before installing its own.
#[derive(Default)]
pub struct Session {
    current: Option<ActiveSubmission>,
}

struct ActiveSubmission {
    id: String,
    started_at: Instant,
    cancel: CancellationToken,
    tracker: ProgressTracker,
    estimated_total_secs: Option<u64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new current submission and start its elapsed clock.
    /// Any in-flight submission is abandoned and its abort signal raised.
    pub fn begin(&mut self, submission: &Submission) -> CancellationToken {
        if let Some(previous) = self.current.take() {
            tracing::warn!("Abandoning in-flight submission {}", previous.id);
            previous.cancel.cancel();
        }

        let id = Uuid::new_v4().to_string();
        let token = CancellationToken::new();
        tracing::info!(
            "Submission {} started: {} ({:.1} MB)",
            id,
            submission.file_name,
            submission.size_mb()
        );

        self.current = Some(ActiveSubmission {
            id,
            started_at: Instant::now(),
            cancel: token.clone(),
            tracker: ProgressTracker::new(),
            estimated_total_secs: None,
        });
        token
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn submission_id(&self) -> Option<&str> {
        self.current.as_ref().map(|active| active.id.as_str())
    }

    pub fn cancel_token(&self) -> Option<CancellationToken> {
        self.current.as_ref().map(|active| active.cancel.clone())
    }

    /// Seed the fallback total-time estimate. Only the first tracker lock
    /// consumes it; later calls on a locked tracker change nothing.
    pub fn set_estimate(&mut self, estimated_total_secs: Option<u64>) {
        if let Some(active) = self.current.as_mut() {
            active.estimated_total_secs = estimated_total_secs;
        }
    }

    /// Seconds since the current submission was dispatched; 0 when idle.
    pub fn elapsed_secs(&self) -> u64 {
        self.current
            .as_ref()
            .map(|active| active.started_at.elapsed().as_secs())
            .unwrap_or(0)
    }

    /// One tick of the shared clock, optionally carrying a fresh progress
    /// fraction. Returns the remaining-time projection once locked.
    pub fn tick(&mut self, progress: Option<u8>) -> Option<u64> {
        let elapsed = self.elapsed_secs();
        let active = self.current.as_mut()?;
        active.tracker.tick(elapsed, progress, active.estimated_total_secs)
    }

    pub fn has_locked_estimate(&self) -> bool {
        self.current
            .as_ref()
            .map(|active| active.tracker.has_locked())
            .unwrap_or(false)
    }

    /// Raise the current submission's abort signal. Idempotent; the slot
    /// stays occupied so a late completion can still be attributed.
    pub fn cancel(&mut self) {
        if let Some(active) = self.current.as_ref() {
            tracing::info!("Cancelling submission {}", active.id);
            active.cancel.cancel();
        }
    }

    /// Cancel and clear the slot entirely.
    pub fn reset(&mut self) {
        if let Some(active) = self.current.take() {
            active.cancel.cancel();
            tracing::info!("Session reset, submission {} discarded", active.id);
        }
    }
}
