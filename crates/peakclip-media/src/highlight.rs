//! Audio energy analysis and highlight selection.
//!
//! This module handles:
//! 1. Extracting the audio track as 16kHz mono f32 samples
//! 2. Computing a windowed RMS energy profile (0.25s buckets)
//! 3. Selecting time-spread energy peaks
//! 4. Producing ordered, mostly-non-overlapping highlight segments

use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use peakclip_models::Segment;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Sample rate for energy analysis.
const ANALYSIS_SAMPLE_RATE: usize = 16_000;

/// RMS window and hop size in seconds. The window is used only for
/// smoothing; the output series has one value per hop with no overlap.
const WINDOW_SECS: f64 = 0.25;

/// Hard cap on accepted peaks regardless of `max_segments`.
const MAX_PEAKS: usize = 12;

/// Bounded decode time for the audio extraction pass.
const EXTRACT_TIMEOUT_SECS: u64 = 600;

/// Configuration for highlight selection.
#[derive(Debug, Clone)]
pub struct HighlightConfig {
    /// Length of each emitted segment, seconds
    pub target_duration_secs: f64,
    /// Maximum number of segments to emit
    pub max_segments: usize,
    /// Minimum spacing between accepted peaks, seconds
    pub min_gap_secs: f64,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            target_duration_secs: 60.0,
            max_segments: 8,
            min_gap_secs: 70.0,
        }
    }
}

impl HighlightConfig {
    /// Config with a bounded clip count.
    pub fn with_max_segments(mut self, max_segments: usize) -> Self {
        self.max_segments = max_segments;
        self
    }
}

/// Normalized RMS energy over time, one value per 0.25s bucket.
///
/// Ephemeral: built in memory, used to derive segments, then dropped.
#[derive(Debug, Clone)]
pub struct EnergyProfile {
    /// Bucket time offsets, seconds
    pub times: Vec<f64>,
    /// Normalized energy in [0, 1], parallel to `times`
    pub energy: Vec<f64>,
}

impl EnergyProfile {
    /// Compute a profile from mono f32 samples.
    ///
    /// Windows that would run past the end of the signal are dropped,
    /// so very short inputs yield an empty profile.
    pub fn from_samples(samples: &[f32], sample_rate: usize) -> Self {
        let window = (sample_rate as f64 * WINDOW_SECS) as usize;
        let hop = window;

        if window == 0 || samples.len() < window {
            return Self {
                times: Vec::new(),
                energy: Vec::new(),
            };
        }

        let mut times = Vec::new();
        let mut rms = Vec::new();

        let mut offset = 0;
        while offset + window <= samples.len() {
            let sum_sq: f64 = samples[offset..offset + window]
                .iter()
                .map(|s| (*s as f64) * (*s as f64))
                .sum();
            times.push(offset as f64 / sample_rate as f64);
            rms.push((sum_sq / window as f64).sqrt());
            offset += hop;
        }

        // Normalize to [0, 1]; epsilon keeps constant signals finite
        let min = rms.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = rms.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let energy = rms
            .iter()
            .map(|r| (r - min) / (max - min + 1e-6))
            .collect();

        Self { times, energy }
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Select energy peaks with a minimum spacing in time.
///
/// Buckets are visited in descending energy order and accepted only
/// when at least `min_gap_secs` from every already-accepted peak, so
/// the result trades strict top-K optimality for temporal spread.
/// Returned indices are in chronological order.
pub fn select_peaks(profile: &EnergyProfile, min_gap_secs: f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..profile.energy.len()).collect();
    order.sort_by(|&a, &b| {
        profile.energy[b]
            .partial_cmp(&profile.energy[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut chosen: Vec<usize> = Vec::new();
    for idx in order {
        let t = profile.times[idx];
        if chosen
            .iter()
            .all(|&c| (t - profile.times[c]).abs() >= min_gap_secs)
        {
            chosen.push(idx);
        }
        if chosen.len() >= MAX_PEAKS {
            break;
        }
    }

    chosen.sort_unstable();
    chosen
}

/// Build segments centered on the first `max_segments` peaks, then
/// resolve overlaps in ascending start order (overlaps of up to 5
/// seconds are tolerated; larger ones drop the later segment).
pub fn build_segments(
    profile: &EnergyProfile,
    peaks: &[usize],
    config: &HighlightConfig,
) -> Vec<Segment> {
    let target = config.target_duration_secs;

    let mut segments: Vec<Segment> = peaks
        .iter()
        .take(config.max_segments)
        .map(|&i| {
            let center = profile.times[i];
            let start = (center - target / 2.0).max(0.0);
            // Two-decimal starts keep ffmpeg seek strings short
            Segment::new((start * 100.0).round() / 100.0, target)
        })
        .collect();

    segments.sort_by(|a, b| {
        a.start_secs
            .partial_cmp(&b.start_secs)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut cleaned: Vec<Segment> = Vec::new();
    let mut last_end = -1.0_f64;
    for seg in segments {
        if seg.start_secs >= last_end - 5.0 {
            last_end = seg.end_secs();
            cleaned.push(seg);
        }
    }
    cleaned
}

/// Analyze a media file and return ordered highlight segments.
///
/// Decode failure on the source is fatal; a source that decodes to an
/// empty or too-short audio track falls back to a single full-length
/// default segment.
pub async fn analyze_highlights(
    media_path: impl AsRef<Path>,
    config: &HighlightConfig,
) -> MediaResult<Vec<Segment>> {
    let media_path = media_path.as_ref();

    debug!(
        path = %media_path.display(),
        min_gap_secs = config.min_gap_secs,
        max_segments = config.max_segments,
        "Starting highlight analysis"
    );

    let temp_audio = NamedTempFile::new()?;
    extract_audio(media_path, temp_audio.path()).await?;
    let samples = load_audio_samples(temp_audio.path()).await?;

    let fallback = vec![Segment::new(0.0, config.target_duration_secs)];

    let profile = EnergyProfile::from_samples(&samples, ANALYSIS_SAMPLE_RATE);
    if profile.is_empty() {
        info!("Empty energy profile, falling back to default segment");
        return Ok(fallback);
    }

    let peaks = select_peaks(&profile, config.min_gap_secs);
    let segments = build_segments(&profile, &peaks, config);

    if segments.is_empty() {
        info!("No usable peaks, falling back to default segment");
        return Ok(fallback);
    }

    info!(
        segments = segments.len(),
        buckets = profile.times.len(),
        "Highlight analysis complete"
    );

    Ok(segments)
}

/// Decode command for 16kHz mono raw f32le PCM.
fn extraction_command(input: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .output_arg("-vn")
        .output_args(["-ac", "1"])
        .output_args(["-ar", &ANALYSIS_SAMPLE_RATE.to_string()])
        .output_args(["-f", "f32le"])
}

/// Extract the audio track to 16kHz mono raw f32le PCM.
///
/// A decode failure means the source has no usable audio track.
async fn extract_audio(input: &Path, output: &Path) -> MediaResult<()> {
    let runner = FfmpegRunner::new().with_timeout(EXTRACT_TIMEOUT_SECS);
    match runner.run(&extraction_command(input, output)).await {
        Ok(()) => Ok(()),
        Err(MediaError::FfmpegFailed { .. }) => Err(MediaError::NoAudio(input.to_path_buf())),
        Err(e) => Err(e),
    }
}

/// Load raw f32le samples from a file.
async fn load_audio_samples(path: &Path) -> MediaResult<Vec<f32>> {
    let bytes = tokio::fs::read(path).await?;

    let samples = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    Ok(samples)
}
