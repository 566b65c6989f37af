// src/orchestrator/mod.rs
// Dispatch Router: decides sync vs async, bounds the exchange, runs the flow

use crate::backend::{
    DispatchError, HttpBackend, JobAccepted, ProcessingMode, SubmitResponse, Submission,
    TranscriptResult, TranscriptionBackend,
};
use crate::config::OrchestratorConfig;
use crate::session::Session;

pub mod estimator;
pub mod poller;
pub mod progress;

use poller::JobPoller;

/// Successful dispatch: either the transcript came back directly, or the
/// backend accepted an asynchronous job to be polled.
#[derive(Debug)]
pub enum DispatchOutcome {
    Completed(TranscriptResult),
    Accepted(JobAccepted),
}

/// One orchestrator drives one submission at a time. Dispatching a new
/// submission abandons any in-flight one.
pub struct Orchestrator {
    config: OrchestratorConfig,
    backend: Box<dyn TranscriptionBackend + Send + Sync>,
    session: Session,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        backend: Box<dyn TranscriptionBackend + Send + Sync>,
    ) -> Self {
        Self {
            config,
            backend,
            session: Session::new(),
        }
    }

    pub fn from_env() -> Self {
        let config = OrchestratorConfig::from_env();
        let backend = Box::new(HttpBackend::new(config.backend_url.clone()));
        Self::new(config, backend)
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mode decision: the configured threshold is the single source of
    /// truth, and the boundary value itself routes asynchronously.
    pub fn mode_for(&self, size_bytes: u64) -> ProcessingMode {
        if size_bytes >= self.config.async_threshold_bytes {
            ProcessingMode::Asynchronous
        } else {
            ProcessingMode::Synchronous
        }
    }

    /// Pre-dispatch total-time estimate for display, using the same
    /// threshold to pick the size class.
    pub fn estimate_for(&self, size_bytes: u64) -> u64 {
        let is_large = self.mode_for(size_bytes) == ProcessingMode::Asynchronous;
        estimator::estimate_total_secs(size_bytes, is_large)
    }

    /// Install the display estimate as the tracker's fallback. Callers that
    /// show a countdown before any progress arrives seed it explicitly.
    pub fn seed_estimate(&mut self, estimated_total_secs: u64) {
        self.session.set_estimate(Some(estimated_total_secs));
    }

    /// Per-second tick entry point for the UI, optionally with the latest
    /// progress fraction. Returns the remaining-time projection once locked.
    pub fn tick(&mut self, progress: Option<u8>) -> Option<u64> {
        self.session.tick(progress)
    }

    pub fn cancel(&mut self) {
        self.session.cancel();
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Send one submission. Starts the shared elapsed clock, bounds the
    /// exchange with the per-mode deadline, and cancels the in-flight
    /// request on timeout or abort.
    pub async fn dispatch(
        &mut self,
        submission: &Submission,
    ) -> Result<DispatchOutcome, DispatchError> {
        let size_bytes = submission.size_bytes();
        let mode = self.mode_for(size_bytes);
        let timeout = self.config.timeout_for(mode);
        let token = self.session.begin(submission);

        tracing::info!(
            "Dispatching {} ({:.1} MB) in {:?} mode, {}s allowance",
            submission.file_name,
            submission.size_mb(),
            mode,
            timeout.as_secs()
        );

        let exchange = self.backend.submit(submission, mode, timeout);
        let response = tokio::select! {
            _ = token.cancelled() => {
                tracing::warn!("Dispatch of {} aborted", submission.file_name);
                return Err(DispatchError::Cancelled);
            }
            outcome = tokio::time::timeout(timeout, exchange) => match outcome {
                Ok(inner) => inner?,
                Err(_) => {
                    tracing::error!(
                        "Dispatch of {} timed out after {}s",
                        submission.file_name,
                        timeout.as_secs()
                    );
                    return Err(DispatchError::Timeout {
                        file_size_bytes: size_bytes,
                        timeout_secs: timeout.as_secs(),
                    });
                }
            },
        };

        match response {
            SubmitResponse::Completed(result) => {
                tracing::info!(
                    "Synchronous transcription done: {} chars, {:.1}x realtime",
                    result.text.len(),
                    result.info.speed_ratio
                );
                Ok(DispatchOutcome::Completed(result))
            }
            SubmitResponse::Accepted(job) => {
                self.session.set_estimate(job.estimated_total_secs());
                if let Some(position) = job.queue_position {
                    tracing::info!("Job {} accepted at queue position {}", job.job_id, position);
                } else {
                    tracing::info!("Job {} accepted", job.job_id);
                }
                Ok(DispatchOutcome::Accepted(job))
            }
        }
    }

    /// Full flow: dispatch, and for asynchronous acceptance poll the job to
    /// its terminal state before returning the transcript.
    pub async fn transcribe(
        &mut self,
        submission: &Submission,
    ) -> Result<TranscriptResult, DispatchError> {
        match self.dispatch(submission).await? {
            DispatchOutcome::Completed(result) => Ok(result),
            DispatchOutcome::Accepted(job) => {
                let token = self
                    .session
                    .cancel_token()
                    .ok_or(DispatchError::Cancelled)?;
                let poller = JobPoller::new(&job.job_id, self.config.poll_interval_secs);
                poller
                    .run(self.backend.as_ref(), &mut self.session, token)
                    .await
            }
        }
    }
}
