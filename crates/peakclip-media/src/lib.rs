//! Media tooling for the PeakClip pipeline.
//!
//! This crate provides:
//! - FFmpeg command builder and runner with timeouts
//! - Source download via yt-dlp with format fallback
//! - Audio energy analysis and highlight segment selection
//! - Vertical cut/format and subtitle burn-in

pub mod clip;
pub mod command;
pub mod download;
pub mod error;
pub mod highlight;

pub use clip::{burn_subtitles, cut_and_format};
pub use command::{check_ffmpeg, check_ytdlp, FfmpegCommand, FfmpegRunner};
pub use download::download_vod;
pub use error::{MediaError, MediaResult};
pub use highlight::{analyze_highlights, EnergyProfile, HighlightConfig};
