// ReTexte core: transcription request orchestration and document export.
//
// The orchestrator decides whether a submission runs synchronously or as a
// polled asynchronous job, bounds each exchange with a per-mode deadline,
// projects remaining time from partial signals, and lays the final
// transcript out as a paginated PDF.

pub mod backend;
pub mod config;
pub mod export;
pub mod orchestrator;
pub mod session;

pub use backend::{
    DispatchError, HttpBackend, JobAccepted, JobHandle, JobStatus, ProcessingMode, Submission,
    TranscriptResult, TranscriptSegment, TranscriptionBackend,
};
pub use config::OrchestratorConfig;
pub use export::{export_pdf, ExportRequest, ExportedDocument};
pub use orchestrator::{DispatchOutcome, Orchestrator};
pub use session::Session;
