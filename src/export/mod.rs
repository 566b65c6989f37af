// src/export/mod.rs
// Transcript → downloadable PDF document

mod paginator;
mod pdf;

pub use paginator::{lines_per_page, paginate, Page, PaginatedDocument, MAX_LINE_CHARS};

use crate::backend::{DispatchError, TranscriptSegment};
use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// Export request as posted by the client: the transcript text, the source
/// filename and optionally the timed segments.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    pub text: String,
    pub filename: String,
    #[serde(default)]
    pub segments: Option<Vec<TranscriptSegment>>,
}

#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub bytes: Vec<u8>,
    pub content_disposition: String,
    pub page_count: usize,
}

/// Build the downloadable PDF. When segments are present each one becomes
/// a timestamped paragraph; otherwise the plain text is used as-is.
pub fn export_pdf(request: &ExportRequest) -> Result<ExportedDocument, DispatchError> {
    if request.text.trim().is_empty() {
        return Err(DispatchError::MalformedInput(
            "transcript text is missing".to_string(),
        ));
    }

    let body = match request.segments.as_deref() {
        Some(segments) if !segments.is_empty() => segment_text(segments),
        _ => request.text.clone(),
    };

    let document = paginator::paginate(&body);
    let generated_on = Utc::now().format("%d/%m/%Y").to_string();
    let bytes = pdf::render(&document, &request.filename, &generated_on);

    tracing::info!(
        "Exported {} page(s) for {} ({} bytes)",
        document.page_count(),
        request.filename,
        bytes.len()
    );

    Ok(ExportedDocument {
        content_disposition: format!(
            "attachment; filename=\"transcription-{}.pdf\"",
            strip_extension(&request.filename)
        ),
        page_count: document.page_count(),
        bytes,
    })
}

fn segment_text(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|segment| format!("[{}] {}", format_timestamp(segment.start), segment.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `M:SS`, minutes unpadded, the formatting the result view uses.
fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn strip_extension(filename: &str) -> String {
    static EXT_RE: OnceLock<Regex> = OnceLock::new();
    let re = EXT_RE.get_or_init(|| Regex::new(r"\.[^/.]+$").expect("valid extension regex"));
    re.replace(filename, "").to_string()
}
