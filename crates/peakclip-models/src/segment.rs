//! Candidate highlight windows.

use serde::{Deserialize, Serialize};

/// A candidate highlight window within the source media.
///
/// Segments are ephemeral: produced by the signal analyzer, consumed
/// once by the clip pipeline, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Offset from the start of the source, in seconds (non-negative)
    pub start_secs: f64,
    /// Window length in seconds (positive)
    pub duration_secs: f64,
}

impl Segment {
    pub fn new(start_secs: f64, duration_secs: f64) -> Self {
        debug_assert!(start_secs >= 0.0);
        debug_assert!(duration_secs > 0.0);
        Self {
            start_secs,
            duration_secs,
        }
    }

    /// End offset in seconds.
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}
