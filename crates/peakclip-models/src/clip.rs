//! Published clip records.

use serde::{Deserialize, Serialize};

use crate::job::JobId;

/// Metadata row for one published clip.
///
/// Created only after the clip's media has been fully produced and
/// uploaded; never mutated afterwards. A job exclusively owns its
/// clips, numbered `1..=N` in segment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRecord {
    /// Owning job
    pub job_id: JobId,
    /// 1-based sequence number within the job
    pub idx: u32,
    /// Object storage key of the published media
    pub path: String,
    /// Generated promotional caption
    pub hook: String,
}

impl ClipRecord {
    pub fn new(job_id: JobId, idx: u32, hook: impl Into<String>) -> Self {
        let path = Self::storage_key(&job_id, idx);
        Self {
            job_id,
            idx,
            path,
            hook: hook.into(),
        }
    }

    /// Storage key for a clip, namespaced by job id.
    pub fn storage_key(job_id: &JobId, idx: u32) -> String {
        format!("{}/clip_{}.mp4", job_id, idx)
    }
}
