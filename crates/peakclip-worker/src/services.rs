//! Capability interfaces for external collaborators.
//!
//! Each external tool or service the pipeline shells out to sits
//! behind a small trait, so the controller and pipeline logic are
//! testable without invoking real processes or networks.

use std::path::Path;

use peakclip_models::{ClipRecord, Job, JobId, JobStatus, Segment, SubtitleCue};

use crate::error::WorkerResult;

/// Fetches source media for a job URL into a local file.
#[cfg_attr(test, mockall::automock)]
pub trait MediaFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> WorkerResult<()>;
}

/// Proposes highlight segments for a local media file.
#[cfg_attr(test, mockall::automock)]
pub trait HighlightAnalyzer {
    async fn analyze(&self, media: &Path) -> WorkerResult<Vec<Segment>>;
}

/// Cuts/formats segments and burns subtitle tracks.
#[cfg_attr(test, mockall::automock)]
pub trait ClipEncoder {
    async fn cut(&self, source: &Path, segment: Segment, output: &Path) -> WorkerResult<()>;
    async fn burn(&self, input: &Path, srt: &Path, output: &Path) -> WorkerResult<()>;
}

/// Produces timestamped transcription cues for a media file.
#[cfg_attr(test, mockall::automock)]
pub trait Transcriber {
    async fn transcribe(&self, media: &Path, workdir: &Path) -> WorkerResult<Vec<SubtitleCue>>;
}

/// Publishes clip files to object storage (upsert by key).
#[cfg_attr(test, mockall::automock)]
pub trait ClipStorage {
    async fn put_clip(&self, path: &Path, key: &str) -> WorkerResult<()>;
}

/// Job queue and clip metadata persistence.
#[cfg_attr(test, mockall::automock)]
pub trait JobStore {
    async fn insert_job(&self, url: &str) -> WorkerResult<Job>;
    async fn claim_next(&self) -> WorkerResult<Option<Job>>;
    async fn finalize_job(&self, job_id: &JobId, status: JobStatus) -> WorkerResult<()>;
    async fn record_clip(&self, clip: &ClipRecord) -> WorkerResult<()>;
}

/// yt-dlp backed fetcher.
#[derive(Debug, Clone, Default)]
pub struct YtDlpFetcher;

impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> WorkerResult<()> {
        peakclip_media::download_vod(url, dest).await?;
        Ok(())
    }
}

/// Energy-profile analyzer backed by ffmpeg audio extraction.
#[derive(Debug, Clone)]
pub struct EnergyAnalyzer {
    config: peakclip_media::HighlightConfig,
}

impl EnergyAnalyzer {
    pub fn new(config: peakclip_media::HighlightConfig) -> Self {
        Self { config }
    }
}

impl HighlightAnalyzer for EnergyAnalyzer {
    async fn analyze(&self, media: &Path) -> WorkerResult<Vec<Segment>> {
        Ok(peakclip_media::analyze_highlights(media, &self.config).await?)
    }
}

/// FFmpeg-backed encoder.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEncoder;

impl ClipEncoder for FfmpegEncoder {
    async fn cut(&self, source: &Path, segment: Segment, output: &Path) -> WorkerResult<()> {
        peakclip_media::cut_and_format(source, segment, output).await?;
        Ok(())
    }

    async fn burn(&self, input: &Path, srt: &Path, output: &Path) -> WorkerResult<()> {
        peakclip_media::burn_subtitles(input, srt, output).await?;
        Ok(())
    }
}

impl ClipStorage for peakclip_storage::ClipBucket {
    async fn put_clip(&self, path: &Path, key: &str) -> WorkerResult<()> {
        self.upload_clip(path, key).await?;
        Ok(())
    }
}

impl JobStore for peakclip_store::JobStoreClient {
    async fn insert_job(&self, url: &str) -> WorkerResult<Job> {
        Ok(peakclip_store::JobStoreClient::insert_job(self, url).await?)
    }

    async fn claim_next(&self) -> WorkerResult<Option<Job>> {
        Ok(peakclip_store::JobStoreClient::claim_next(self).await?)
    }

    async fn finalize_job(&self, job_id: &JobId, status: JobStatus) -> WorkerResult<()> {
        Ok(peakclip_store::JobStoreClient::finalize_job(self, job_id, status).await?)
    }

    async fn record_clip(&self, clip: &ClipRecord) -> WorkerResult<()> {
        Ok(self.insert_clip(clip).await?)
    }
}
