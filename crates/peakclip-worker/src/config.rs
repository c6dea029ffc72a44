//! Worker configuration.

use std::path::PathBuf;

/// Bounds for the per-job clip count.
const MIN_CLIPS: usize = 1;
const MAX_CLIPS: usize = 12;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Explicit source URL for an ad-hoc run; when set, a pending job
    /// is inserted for it before the normal claim path runs
    pub source_url: Option<String>,
    /// Maximum clips per job, bounded to [1, 12]
    pub max_clips: usize,
    /// Target clip length in seconds
    pub clip_duration_secs: f64,
    /// Parent directory for per-job temp workspaces
    pub work_dir: PathBuf,
    /// Whisper model size
    pub whisper_model: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            source_url: None,
            max_clips: 6,
            clip_duration_secs: 60.0,
            work_dir: PathBuf::from("/tmp/peakclip"),
            whisper_model: "small".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let max_clips = std::env::var("MAX_CLIPS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(6);

        Self {
            source_url: std::env::var("SOURCE_URL").ok().filter(|s| !s.is_empty()),
            max_clips: max_clips.clamp(MIN_CLIPS, MAX_CLIPS),
            clip_duration_secs: 60.0,
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/peakclip")),
            whisper_model: std::env::var("WHISPER_MODEL").unwrap_or_else(|_| "small".to_string()),
        }
    }
}
