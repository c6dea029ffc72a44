//! Subtitle cues and SRT rendering.
//!
//! Transcription output is converted into cues with timestamps re-based
//! to the clip's own zero point, then rendered as an SRT file with
//! millisecond precision and indices contiguous from 1.

use serde::{Deserialize, Serialize};

/// One subtitle cue within a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    /// 1-based index within the track
    pub index: u32,
    /// Cue start, seconds from clip zero
    pub start_secs: f64,
    /// Cue end, seconds from clip zero
    pub end_secs: f64,
    /// Cue text, trimmed
    pub text: String,
}

impl SubtitleCue {
    /// Build a cue from raw transcription times, clamping negative
    /// timestamps to zero.
    pub fn from_transcription(index: u32, start_secs: f64, end_secs: f64, text: &str) -> Self {
        Self {
            index,
            start_secs: start_secs.max(0.0),
            end_secs: end_secs.max(0.0),
            text: text.trim().to_string(),
        }
    }
}

/// Format seconds as an SRT timestamp: `HH:MM:SS,mmm`.
fn format_srt_timestamp(secs: f64) -> String {
    let secs = secs.max(0.0);
    let total_ms = (secs * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let s = total_secs % 60;
    let m = (total_secs / 60) % 60;
    let h = total_secs / 3600;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Render cues as an SRT document.
///
/// Indices are renumbered to be contiguous from 1 regardless of the
/// indices carried on the cues.
pub fn render_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_timestamp(cue.start_secs),
            format_srt_timestamp(cue.end_secs),
            cue.text
        ));
    }
    out
}
