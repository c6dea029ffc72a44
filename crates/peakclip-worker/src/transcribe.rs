//! Whisper CLI transcription.
//!
//! Runs the `whisper` command in language auto-detect mode with JSON
//! output and converts the result into subtitle cues re-based to the
//! clip's own zero point.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use peakclip_models::SubtitleCue;

use crate::error::{WorkerError, WorkerResult};
use crate::services::Transcriber;

/// Transcription timeout; expiry fails the segment.
const TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(900);

/// JSON document whisper writes next to the input.
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

/// Transcriber backed by the whisper CLI.
#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    model: String,
}

impl WhisperTranscriber {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, media: &Path, workdir: &Path) -> WorkerResult<Vec<SubtitleCue>> {
        which::which("whisper")
            .map_err(|_| WorkerError::transcription("whisper not found in PATH"))?;

        info!(media = %media.display(), model = %self.model, "Transcribing clip");

        // Language omitted: whisper auto-detects
        let output = tokio::time::timeout(
            TRANSCRIBE_TIMEOUT,
            tokio::process::Command::new("whisper")
                .arg(media)
                .args(["--model", &self.model])
                .args(["--output_format", "json"])
                .args(["--fp16", "False"])
                .arg("--output_dir")
                .arg(workdir)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            WorkerError::transcription(format!(
                "whisper timed out after {} seconds",
                TRANSCRIBE_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| WorkerError::transcription(format!("failed to run whisper: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WorkerError::transcription(stderr.trim().to_string()));
        }

        let stem = media
            .file_stem()
            .ok_or_else(|| WorkerError::transcription("media path has no file stem"))?;
        let json_path = workdir.join(stem).with_extension("json");

        let body = tokio::fs::read_to_string(&json_path)
            .await
            .map_err(|e| {
                WorkerError::transcription(format!(
                    "whisper output {} unreadable: {}",
                    json_path.display(),
                    e
                ))
            })?;

        let parsed: WhisperOutput = serde_json::from_str(&body)
            .map_err(|e| WorkerError::transcription(format!("bad whisper JSON: {}", e)))?;

        debug!(cues = parsed.segments.len(), "Transcription complete");

        let cues = parsed
            .segments
            .iter()
            .enumerate()
            .map(|(i, seg)| {
                SubtitleCue::from_transcription(i as u32 + 1, seg.start, seg.end, &seg.text)
            })
            .collect();

        Ok(cues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whisper_json_parses() {
        let body = r#"{
            "text": " hello world",
            "language": "en",
            "segments": [
                {"id": 0, "start": -0.2, "end": 2.4, "text": " hello"},
                {"id": 1, "start": 2.4, "end": 4.0, "text": " world"}
            ]
        }"#;

        let parsed: WhisperOutput = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.segments.len(), 2);

        let cue = SubtitleCue::from_transcription(
            1,
            parsed.segments[0].start,
            parsed.segments[0].end,
            &parsed.segments[0].text,
        );
        assert_eq!(cue.start_secs, 0.0);
        assert_eq!(cue.text, "hello");
    }

    #[test]
    fn test_empty_segments_is_valid() {
        let parsed: WhisperOutput = serde_json::from_str(r#"{"text": ""}"#).unwrap();
        assert!(parsed.segments.is_empty());
    }
}
