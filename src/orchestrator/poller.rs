// src/orchestrator/poller.rs
// Asynchronous job polling loop

use crate::backend::{DispatchError, JobHandle, JobStatus, TranscriptResult, TranscriptionBackend};
use crate::session::Session;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const GENERIC_JOB_FAILURE: &str = "Transcription job failed";

/// Polls one asynchronous job to its terminal state: a lazy, finite
/// sequence of status snapshots with at most one outstanding query.
/// The sequence cannot be restarted; `run` consumes the poller.
pub struct JobPoller {
    job_id: String,
    interval: Duration,
    finished: bool,
}

impl JobPoller {
    pub fn new(job_id: impl Into<String>, interval_secs: u64) -> Self {
        Self {
            job_id: job_id.into(),
            interval: Duration::from_secs(interval_secs),
            finished: false,
        }
    }

    /// Next status snapshot, or `None` once a terminal status has been
    /// observed. Sequential awaits keep at most one query in flight.
    pub async fn next_snapshot(
        &mut self,
        backend: &dyn TranscriptionBackend,
    ) -> Result<Option<JobHandle>, DispatchError> {
        if self.finished {
            return Ok(None);
        }

        let snapshot = backend.job_status(&self.job_id).await?;
        if snapshot.status.is_terminal() {
            self.finished = true;
        }
        Ok(Some(snapshot))
    }

    /// Drive the job to completion, feeding each snapshot's progress into
    /// the session's tracker. Cancellable between ticks; cancellation after
    /// the terminal snapshot has no effect.
    pub async fn run(
        mut self,
        backend: &dyn TranscriptionBackend,
        session: &mut Session,
        cancel: CancellationToken,
    ) -> Result<TranscriptResult, DispatchError> {
        loop {
            if cancel.is_cancelled() {
                tracing::info!("Polling of job {} cancelled", self.job_id);
                return Err(DispatchError::Cancelled);
            }

            let snapshot = match self.next_snapshot(backend).await? {
                Some(snapshot) => snapshot,
                None => {
                    // Terminal state already consumed on a previous turn.
                    return Err(DispatchError::JobFailed {
                        job_id: self.job_id.clone(),
                        reason: GENERIC_JOB_FAILURE.to_string(),
                    });
                }
            };

            session.tick(Some(snapshot.progress));
            tracing::debug!(
                "Job {}: {:?} at {}%",
                self.job_id,
                snapshot.status,
                snapshot.progress
            );

            match snapshot.status {
                JobStatus::Succeeded => {
                    tracing::info!("Job {} succeeded, fetching result", self.job_id);
                    return backend.fetch_result(&self.job_id).await;
                }
                JobStatus::Failed => {
                    let reason = snapshot
                        .error
                        .unwrap_or_else(|| GENERIC_JOB_FAILURE.to_string());
                    tracing::error!("Job {} failed: {}", self.job_id, reason);
                    return Err(DispatchError::JobFailed {
                        job_id: self.job_id.clone(),
                        reason,
                    });
                }
                JobStatus::Queued | JobStatus::Running => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            tracing::info!("Polling of job {} cancelled", self.job_id);
                            return Err(DispatchError::Cancelled);
                        }
                        _ = tokio::time::sleep(self.interval) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{sample_result, MockBackend};
    use crate::backend::Submission;

    fn active_session() -> Session {
        let mut session = Session::new();
        session.begin(&Submission::new("talk.mp3", vec![0u8; 64], "fr"));
        session
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_to_success_with_single_lock() {
        let backend = MockBackend::new();
        backend.push_status(JobStatus::Queued, 0);
        backend.push_status(JobStatus::Running, 15);
        backend.push_status(JobStatus::Running, 60);
        backend.push_status(JobStatus::Succeeded, 100);
        *backend.result.lock().unwrap() = Some(sample_result("fini"));

        let mut session = active_session();
        let cancel = session.cancel_token().unwrap();

        // The Queued(0) tick must not lock; Running(15) must.
        let poller = JobPoller::new("job-1", 3);
        let result = poller.run(&backend, &mut session, cancel).await.unwrap();

        assert_eq!(result.text, "fini");
        assert!(session.has_locked_estimate());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_maps_to_job_failed() {
        let backend = MockBackend::new();
        backend.push_status(JobStatus::Queued, 0);
        backend.statuses.lock().unwrap().push_back(JobHandle {
            job_id: String::new(),
            status: JobStatus::Failed,
            progress: 40,
            error: Some("out of memory".to_string()),
        });

        let mut session = active_session();
        let cancel = session.cancel_token().unwrap();
        let poller = JobPoller::new("job-2", 3);
        let err = poller.run(&backend, &mut session, cancel).await.unwrap_err();

        match err {
            DispatchError::JobFailed { job_id, reason } => {
                assert_eq!(job_id, "job-2");
                assert_eq!(reason, "out of memory");
            }
            other => panic!("expected JobFailed, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_is_not_a_transport_error() {
        let backend = MockBackend::new();
        backend.push_status(JobStatus::Running, 50);

        let mut session = active_session();
        let cancel = session.cancel_token().unwrap();
        cancel.cancel();

        let poller = JobPoller::new("job-3", 3);
        let err = poller.run(&backend, &mut session, cancel).await.unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled));
        assert_eq!(err.kind(), "cancelled");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_is_not_restartable() {
        let backend = MockBackend::new();
        backend.push_status(JobStatus::Succeeded, 100);
        backend.push_status(JobStatus::Running, 10);

        let mut poller = JobPoller::new("job-4", 3);
        let first = poller.next_snapshot(&backend).await.unwrap();
        assert_eq!(first.unwrap().status, JobStatus::Succeeded);

        // Terminal status observed; the sequence is exhausted even though
        // the backend still has a scripted snapshot.
        let after_terminal = poller.next_snapshot(&backend).await.unwrap();
        assert!(after_terminal.is_none());
    }
}
