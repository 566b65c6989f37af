// src/backend/types.rs
// Wire types and error definitions for the transcription backend

use serde::{Deserialize, Serialize};
use thiserror::Error;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One user-initiated transcription request. Immutable once created;
/// a new submission replaces the previous one wholesale.
#[derive(Debug, Clone)]
pub struct Submission {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub language: String,
}

impl Submission {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, language: &str) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            language: crate::config::normalize_language(language),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn size_mb(&self) -> f64 {
        self.size_bytes() as f64 / BYTES_PER_MB
    }
}

/// How a submission is carried out. Decided once at dispatch time from the
/// file size and never changed mid-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    Synchronous,
    Asynchronous,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptInfo {
    pub language: String,
    pub duration: f64,
    pub processing_time: f64,
    pub speed_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    pub filename: String,
    pub model: String,
    pub device: String,
}

/// Final transcription result, exactly as the backend reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
    pub info: TranscriptInfo,
    pub metadata: TranscriptMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    #[serde(rename = "queued")]
    Queued,
    #[serde(rename = "processing")]
    Running,
    #[serde(rename = "completed")]
    Succeeded,
    #[serde(rename = "error")]
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// Acceptance body returned when the backend queues an asynchronous job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobAccepted {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub estimated_time_minutes: Option<u64>,
    #[serde(default)]
    pub estimated_time_seconds: Option<u64>,
    #[serde(default)]
    pub queue_position: Option<u32>,
}

impl JobAccepted {
    /// Backend estimate in seconds, preferring the finer-grained field.
    pub fn estimated_total_secs(&self) -> Option<u64> {
        self.estimated_time_seconds
            .or_else(|| self.estimated_time_minutes.map(|m| m * 60))
    }
}

/// One status snapshot of an in-flight asynchronous job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobHandle {
    #[serde(default)]
    pub job_id: String,
    pub status: JobStatus,
    /// 0-100, monotonically non-decreasing while Running.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub error: Option<String>,
}

/// Successful outcome of a submission exchange, shaped by the mode flag
/// the request carried.
#[derive(Debug, Clone)]
pub enum SubmitResponse {
    Completed(TranscriptResult),
    Accepted(JobAccepted),
}

/// Dispatch error taxonomy. Cancellation is never reported as `Transport`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(
        "Transcription timed out after {timeout_secs}s ({:.1} MB file). Try splitting the file.",
        *file_size_bytes as f64 / 1048576.0
    )]
    Timeout {
        file_size_bytes: u64,
        timeout_secs: u64,
    },

    #[error("Backend error (HTTP {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Transcription job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },

    #[error("Transcription cancelled")]
    Cancelled,

    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

impl DispatchError {
    /// Machine-readable error kind alongside the user-facing message.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Timeout { .. } => "timeout",
            DispatchError::Backend { .. } => "backend",
            DispatchError::Transport(_) => "transport",
            DispatchError::JobFailed { .. } => "job_failed",
            DispatchError::Cancelled => "cancelled",
            DispatchError::MalformedInput(_) => "malformed_input",
        }
    }
}
