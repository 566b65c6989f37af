// src/orchestrator/progress.rs
// Remaining-time tracker with lock-once semantics

/// Progress fractions at or below this value are considered too early to
/// project from.
const PROGRESS_LOCK_FLOOR: u8 = 10;

/// Turns elapsed wall-clock time and partial progress signals into a
/// remaining-time figure.
///
/// The estimate is computed at most once per submission: the first reported
/// progress above 10% wins; failing that, the first known total estimate
/// wins. After that single lock the value only counts down with elapsed
/// time and is never recomputed from later signals. This mirrors the
/// observed behavior of the original client; continuous re-estimation would
/// arguably be more correct but would change what users see mid-flight.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    lock: Option<LockedEstimate>,
}

#[derive(Debug, Clone, Copy)]
struct LockedEstimate {
    remaining_secs: u64,
    elapsed_at_lock: u64,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// One tick of the shared elapsed clock. Returns the remaining seconds,
    /// or `None` while no reliable signal has arrived yet.
    pub fn tick(
        &mut self,
        elapsed_secs: u64,
        progress: Option<u8>,
        estimated_total_secs: Option<u64>,
    ) -> Option<u64> {
        if let Some(lock) = self.lock {
            let since_lock = elapsed_secs.saturating_sub(lock.elapsed_at_lock);
            return Some(lock.remaining_secs.saturating_sub(since_lock));
        }

        if let Some(fraction) = progress.filter(|p| *p > PROGRESS_LOCK_FLOOR) {
            let projected_total = elapsed_secs * 100 / fraction as u64;
            let remaining = projected_total.saturating_sub(elapsed_secs);
            tracing::info!(
                "Remaining time locked from progress {}%: {}s left after {}s",
                fraction,
                remaining,
                elapsed_secs
            );
            self.lock = Some(LockedEstimate {
                remaining_secs: remaining,
                elapsed_at_lock: elapsed_secs,
            });
            return Some(remaining);
        }

        if let Some(total) = estimated_total_secs {
            let remaining = total.saturating_sub(elapsed_secs);
            tracing::info!(
                "Remaining time locked from initial estimate: {}s left after {}s",
                remaining,
                elapsed_secs
            );
            self.lock = Some(LockedEstimate {
                remaining_secs: remaining,
                elapsed_at_lock: elapsed_secs,
            });
            return Some(remaining);
        }

        None
    }

    pub fn reset(&mut self) {
        self.lock = None;
    }
}
