//! Shared data models for the PeakClip pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their status lifecycle
//! - Highlight segments
//! - Published clip records
//! - Subtitle cues and SRT rendering

pub mod clip;
pub mod job;
pub mod segment;
pub mod subtitle;

// Re-export common types
pub use clip::ClipRecord;
pub use job::{Job, JobId, JobStatus};
pub use segment::Segment;
pub use subtitle::{render_srt, SubtitleCue};
