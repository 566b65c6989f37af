// src/orchestrator/estimator.rs
// Processing-time estimate from file size

/// Throughput assumptions in MB of audio per minute of processing. Large
/// files run through the slower asynchronous path and its queue.
const SMALL_CLASS_MB_PER_MIN: f64 = 12.0;
const LARGE_CLASS_MB_PER_MIN: f64 = 8.0;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Estimated total processing time in seconds, rounded up to a whole
/// minute, never below one minute. Pure and deterministic.
pub fn estimate_total_secs(size_bytes: u64, is_large_class: bool) -> u64 {
    let rate = if is_large_class {
        LARGE_CLASS_MB_PER_MIN
    } else {
        SMALL_CLASS_MB_PER_MIN
    };

    let size_mb = size_bytes as f64 / BYTES_PER_MB;
    let minutes = (size_mb / rate).ceil().max(1.0);
    minutes as u64 * 60
}
