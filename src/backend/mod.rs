// src/backend/mod.rs
// Transcription backend client boundary

mod types;

pub use types::{
    DispatchError, JobAccepted, JobHandle, JobStatus, ProcessingMode, SubmitResponse, Submission,
    TranscriptInfo, TranscriptMetadata, TranscriptResult, TranscriptSegment,
};

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const GENERIC_BACKEND_ERROR: &str = "Transcription failed";

/// Seam to the remote transcription service. One submission exchange plus
/// the two polling queries for asynchronous jobs.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Send the file for transcription. The `mode` flag travels with the
    /// request; `timeout` bounds the whole exchange.
    async fn submit(
        &self,
        submission: &Submission,
        mode: ProcessingMode,
        timeout: Duration,
    ) -> Result<SubmitResponse, DispatchError>;

    /// Fetch one status snapshot of an asynchronous job.
    async fn job_status(&self, job_id: &str) -> Result<JobHandle, DispatchError>;

    /// Fetch the final result of a succeeded asynchronous job.
    async fn fetch_result(&self, job_id: &str) -> Result<TranscriptResult, DispatchError>;

    fn name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the transcription service described in the backend's
/// `/transcribe` API: multipart submission, status and result queries.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!("Transcription backend client initialized: {}", base_url);

        Self { base_url, client }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Extract the backend's reported error message, falling back to a
    /// generic one when the body is not the expected JSON shape.
    pub(crate) fn error_message(body: &str) -> String {
        serde_json::from_str::<BackendErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.detail.or(parsed.error))
            .filter(|msg| !msg.trim().is_empty())
            .unwrap_or_else(|| GENERIC_BACKEND_ERROR.to_string())
    }

    async fn error_from_response(resp: reqwest::Response) -> DispatchError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        DispatchError::Backend {
            status,
            message: Self::error_message(&body),
        }
    }
}

#[async_trait]
impl TranscriptionBackend for HttpBackend {
    async fn submit(
        &self,
        submission: &Submission,
        mode: ProcessingMode,
        timeout: Duration,
    ) -> Result<SubmitResponse, DispatchError> {
        let file_part = multipart::Part::bytes(submission.bytes.clone())
            .file_name(submission.file_name.clone())
            .mime_str("application/octet-stream")
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let is_async = mode == ProcessingMode::Asynchronous;
        let form = multipart::Form::new()
            .text("language", submission.language.clone())
            .text("async", is_async.to_string())
            .part("file", file_part);

        let response = self
            .client
            .post(self.endpoint("/transcribe"))
            .timeout(timeout)
            .multipart(form)
            .send()
            .await;

        match response {
            Ok(resp) => {
                let status = resp.status();
                if !status.is_success() {
                    return Err(Self::error_from_response(resp).await);
                }

                if is_async {
                    let accepted: JobAccepted = resp
                        .json()
                        .await
                        .map_err(|e| DispatchError::Transport(e.to_string()))?;
                    Ok(SubmitResponse::Accepted(accepted))
                } else {
                    let result: TranscriptResult = resp
                        .json()
                        .await
                        .map_err(|e| DispatchError::Transport(e.to_string()))?;
                    Ok(SubmitResponse::Completed(result))
                }
            }
            Err(e) => {
                if e.is_timeout() {
                    Err(DispatchError::Timeout {
                        file_size_bytes: submission.size_bytes(),
                        timeout_secs: timeout.as_secs(),
                    })
                } else {
                    Err(DispatchError::Transport(e.to_string()))
                }
            }
        }
    }

    async fn job_status(&self, job_id: &str) -> Result<JobHandle, DispatchError> {
        let response = self
            .client
            .get(self.endpoint(&format!("/transcribe/status/{}", job_id)))
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let mut handle: JobHandle = response
            .json()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;
        if handle.job_id.is_empty() {
            handle.job_id = job_id.to_string();
        }
        Ok(handle)
    }

    async fn fetch_result(&self, job_id: &str) -> Result<TranscriptResult, DispatchError> {
        let response = self
            .client
            .get(self.endpoint(&format!("/transcribe/result/{}", job_id)))
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))
    }

    fn name(&self) -> &str {
        "ReTexte backend"
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted backend for orchestrator and poller tests.
    pub(crate) struct MockBackend {
        pub submit_response: Mutex<Option<Result<SubmitResponse, DispatchError>>>,
        pub submit_delay: Option<Duration>,
        pub statuses: Mutex<VecDeque<JobHandle>>,
        pub result: Mutex<Option<TranscriptResult>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self {
                submit_response: Mutex::new(None),
                submit_delay: None,
                statuses: Mutex::new(VecDeque::new()),
                result: Mutex::new(None),
            }
        }

        pub fn with_submit(response: Result<SubmitResponse, DispatchError>) -> Self {
            let backend = Self::new();
            *backend.submit_response.lock().unwrap() = Some(response);
            backend
        }

        pub fn push_status(&self, status: JobStatus, progress: u8) {
            self.statuses.lock().unwrap().push_back(JobHandle {
                job_id: String::new(),
                status,
                progress,
                error: None,
            });
        }
    }

    pub(crate) fn sample_result(text: &str) -> TranscriptResult {
        TranscriptResult {
            text: text.to_string(),
            segments: vec![TranscriptSegment {
                start: 0.0,
                end: 2.0,
                text: text.to_string(),
            }],
            info: TranscriptInfo {
                language: "fr".to_string(),
                duration: 120.0,
                processing_time: 118.0,
                speed_ratio: 120.0 / 118.0,
            },
            metadata: TranscriptMetadata {
                filename: "audio.mp3".to_string(),
                model: "medium".to_string(),
                device: "cuda".to_string(),
            },
        }
    }

    #[async_trait]
    impl TranscriptionBackend for MockBackend {
        async fn submit(
            &self,
            submission: &Submission,
            _mode: ProcessingMode,
            timeout: Duration,
        ) -> Result<SubmitResponse, DispatchError> {
            if let Some(delay) = self.submit_delay {
                tokio::time::sleep(delay).await;
                return Err(DispatchError::Timeout {
                    file_size_bytes: submission.size_bytes(),
                    timeout_secs: timeout.as_secs(),
                });
            }
            self.submit_response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| {
                    Err(DispatchError::Transport("no scripted response".to_string()))
                })
        }

        async fn job_status(&self, job_id: &str) -> Result<JobHandle, DispatchError> {
            let mut statuses = self.statuses.lock().unwrap();
            let mut handle = statuses
                .pop_front()
                .ok_or_else(|| DispatchError::Transport("no scripted status".to_string()))?;
            handle.job_id = job_id.to_string();
            Ok(handle)
        }

        async fn fetch_result(&self, _job_id: &str) -> Result<TranscriptResult, DispatchError> {
            self.result
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| DispatchError::Transport("no scripted result".to_string()))
        }

        fn name(&self) -> &str {
            "mock"
        }
    }
}
