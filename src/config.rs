use crate::backend::ProcessingMode;
use std::env;
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_LANGUAGE: &str = "fr";

/// Single authoritative routing threshold. The historical client-side 50 MB
/// estimate threshold and relay-side 100 MB routing threshold diverged; one
/// value now drives both the mode decision and the estimator size class.
pub const DEFAULT_ASYNC_THRESHOLD_BYTES: u64 = 100 * 1024 * 1024;

pub const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_ASYNC_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub backend_url: String,
    pub async_threshold_bytes: u64,
    pub sync_timeout_secs: u64,
    pub async_timeout_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            async_threshold_bytes: DEFAULT_ASYNC_THRESHOLD_BYTES,
            sync_timeout_secs: DEFAULT_SYNC_TIMEOUT_SECS,
            async_timeout_secs: DEFAULT_ASYNC_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl OrchestratorConfig {
    /// Build from environment variables, falling back to defaults. This is
    /// the whole configuration surface: the backend address plus the
    /// threshold and timeout constants.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            backend_url: env::var("RETEXTE_BACKEND_URL")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            async_threshold_bytes: env_u64("RETEXTE_ASYNC_THRESHOLD_MB", 100) * 1024 * 1024,
            sync_timeout_secs: env_u64("RETEXTE_SYNC_TIMEOUT_SECS", DEFAULT_SYNC_TIMEOUT_SECS),
            async_timeout_secs: env_u64("RETEXTE_ASYNC_TIMEOUT_SECS", DEFAULT_ASYNC_TIMEOUT_SECS),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }

    /// Per-mode deadline for the whole dispatch exchange. Large asynchronous
    /// submissions get an hour; synchronous ones ten minutes.
    pub fn timeout_for(&self, mode: ProcessingMode) -> Duration {
        match mode {
            ProcessingMode::Synchronous => Duration::from_secs(self.sync_timeout_secs),
            ProcessingMode::Asynchronous => Duration::from_secs(self.async_timeout_secs),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

pub fn normalize_language(input: &str) -> String {
    match input.trim().to_lowercase().as_str() {
        "fr" => "fr".to_string(),
        "en" => "en".to_string(),
        "es" => "es".to_string(),
        "auto" => "auto".to_string(),
        _ => DEFAULT_LANGUAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_by_mode() {
        let config = OrchestratorConfig::default();
        assert_eq!(
            config.timeout_for(ProcessingMode::Synchronous),
            Duration::from_secs(600)
        );
        assert_eq!(
            config.timeout_for(ProcessingMode::Asynchronous),
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language(" EN "), "en");
        assert_eq!(normalize_language("auto"), "auto");
        assert_eq!(normalize_language("klingon"), "fr");
    }
}
