//! Job controller state machine.
//!
//! Claims one pending job, drives the clip pipeline once per selected
//! segment, and finalizes the job's terminal status exactly once on
//! every path. Errors inside a job run never escape to crash the
//! worker; they become `status = error` on the job.

use tracing::{error, info};

use peakclip_models::{ClipRecord, Job, JobId, JobStatus, Segment};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::pipeline::produce_clip;
use crate::services::{
    ClipEncoder, ClipStorage, HighlightAnalyzer, JobStore, MediaFetcher, Transcriber,
};

/// Terminal summary of one worker pass.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Clips recorded before the run ended (partial on error)
    pub clips: usize,
}

/// Drives the pending -> processing -> {done, error} lifecycle.
pub struct JobController<F, A, E, T, O, S> {
    fetcher: F,
    analyzer: A,
    encoder: E,
    transcriber: T,
    storage: O,
    store: S,
    config: WorkerConfig,
}

impl<F, A, E, T, O, S> JobController<F, A, E, T, O, S>
where
    F: MediaFetcher,
    A: HighlightAnalyzer,
    E: ClipEncoder,
    T: Transcriber,
    O: ClipStorage,
    S: JobStore,
{
    pub fn new(
        fetcher: F,
        analyzer: A,
        encoder: E,
        transcriber: T,
        storage: O,
        store: S,
        config: WorkerConfig,
    ) -> Self {
        Self {
            fetcher,
            analyzer,
            encoder,
            transcriber,
            storage,
            store,
            config,
        }
    }

    /// Run one worker pass: ensure a pending job exists (for ad-hoc
    /// source URLs), claim the oldest pending job, process it, and
    /// finalize. Returns `None` when nothing was pending.
    pub async fn run_once(&self) -> WorkerResult<Option<JobOutcome>> {
        if let Some(url) = &self.config.source_url {
            let job = self.store.insert_job(url).await?;
            info!(job_id = %job.id, url, "Created ad-hoc job");
        }

        let Some(job) = self.store.claim_next().await? else {
            info!("No pending jobs");
            return Ok(None);
        };

        let mut clips = Vec::new();
        let result = self.run_job(&job, &mut clips).await;

        // Finalize exactly once, on success and on failure alike.
        // Clips uploaded before a failure stay published and recorded,
        // and the outcome reports them.
        let status = match result {
            Ok(()) => JobStatus::Done,
            Err(e) => {
                error!(job_id = %job.id, error = %e, clips = clips.len(), "Job failed");
                JobStatus::Error
            }
        };
        self.store.finalize_job(&job.id, status).await?;

        info!(job_id = %job.id, status = %status, clips = clips.len(), "Job finished");
        Ok(Some(JobOutcome {
            job_id: job.id.clone(),
            status,
            clips: clips.len(),
        }))
    }

    /// Download, analyze, and run the pipeline per segment in order.
    ///
    /// The temp workspace is dropped (and deleted) on every exit path.
    /// The first segment failure stops the remaining segments; clips
    /// produced before it stay in `clips`.
    async fn run_job(&self, job: &Job, clips: &mut Vec<ClipRecord>) -> WorkerResult<()> {
        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        let workspace = tempfile::Builder::new()
            .prefix("peakclip-")
            .tempdir_in(&self.config.work_dir)?;

        info!(job_id = %job.id, url = %job.url, max_clips = self.config.max_clips, "Processing job");

        let vod_path = workspace.path().join("vod.mp4");
        self.fetcher.fetch(&job.url, &vod_path).await?;

        let mut segments = self.analyzer.analyze(&vod_path).await?;
        if segments.is_empty() {
            segments = vec![Segment::new(0.0, self.config.clip_duration_secs)];
        }

        for (i, segment) in segments.into_iter().enumerate() {
            let idx = i as u32 + 1;
            let clip = produce_clip(
                &self.encoder,
                &self.transcriber,
                &self.storage,
                &self.store,
                workspace.path(),
                &vod_path,
                segment,
                &job.id,
                idx,
            )
            .await?;
            clips.push(clip);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use peakclip_models::SubtitleCue;

    use crate::error::WorkerError;
    use crate::services::{
        MockClipEncoder, MockClipStorage, MockHighlightAnalyzer, MockJobStore, MockMediaFetcher,
        MockTranscriber,
    };

    fn test_config() -> WorkerConfig {
        WorkerConfig {
            work_dir: std::env::temp_dir().join("peakclip-tests"),
            ..WorkerConfig::default()
        }
    }

    fn processing_job() -> Job {
        let mut job = Job::new("https://example.com/vod");
        job.status = JobStatus::Processing;
        job
    }

    fn ok_fetcher() -> MockMediaFetcher {
        let mut fetcher = MockMediaFetcher::new();
        fetcher.expect_fetch().returning(|_, _| Ok(()));
        fetcher
    }

    fn ok_encoder() -> MockClipEncoder {
        let mut encoder = MockClipEncoder::new();
        encoder.expect_cut().returning(|_, _, _| Ok(()));
        encoder.expect_burn().returning(|_, _, _| Ok(()));
        encoder
    }

    fn quiet_transcriber() -> MockTranscriber {
        let mut transcriber = MockTranscriber::new();
        transcriber.expect_transcribe().returning(|_, _| {
            Ok(vec![SubtitleCue::from_transcription(1, 0.0, 2.0, "hello")])
        });
        transcriber
    }

    fn ok_storage() -> MockClipStorage {
        let mut storage = MockClipStorage::new();
        storage.expect_put_clip().returning(|_, _| Ok(()));
        storage
    }

    fn analyzer_with(segments: Vec<Segment>) -> MockHighlightAnalyzer {
        let mut analyzer = MockHighlightAnalyzer::new();
        analyzer
            .expect_analyze()
            .returning(move |_| Ok(segments.clone()));
        analyzer
    }

    /// Store double that records clips and finalizations.
    fn recording_store(
        job: Job,
        recorded: Arc<Mutex<Vec<ClipRecord>>>,
        finalized: Arc<Mutex<Vec<(JobId, JobStatus)>>>,
    ) -> MockJobStore {
        let mut store = MockJobStore::new();
        store
            .expect_claim_next()
            .times(1)
            .returning(move || Ok(Some(job.clone())));
        store.expect_record_clip().returning(move |clip| {
            recorded.lock().unwrap().push(clip.clone());
            Ok(())
        });
        store
            .expect_finalize_job()
            .times(1)
            .returning(move |id, status| {
                finalized.lock().unwrap().push((id.clone(), status));
                Ok(())
            });
        store
    }

    #[tokio::test]
    async fn test_successful_job_finalized_done_with_contiguous_indices() {
        let job = processing_job();
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let finalized = Arc::new(Mutex::new(Vec::new()));

        let controller = JobController::new(
            ok_fetcher(),
            analyzer_with(vec![
                Segment::new(0.0, 60.0),
                Segment::new(100.0, 60.0),
                Segment::new(200.0, 60.0),
            ]),
            ok_encoder(),
            quiet_transcriber(),
            ok_storage(),
            recording_store(job.clone(), Arc::clone(&recorded), Arc::clone(&finalized)),
            test_config(),
        );

        let outcome = controller.run_once().await.unwrap().unwrap();
        assert_eq!(outcome.status, JobStatus::Done);
        assert_eq!(outcome.clips, 3);

        let idxs: Vec<u32> = recorded.lock().unwrap().iter().map(|c| c.idx).collect();
        assert_eq!(idxs, vec![1, 2, 3]);

        let finalized = finalized.lock().unwrap();
        assert_eq!(finalized.len(), 1);
        assert_eq!(finalized[0], (job.id, JobStatus::Done));
    }

    #[tokio::test]
    async fn test_mid_job_failure_keeps_earlier_clips_and_marks_error() {
        let job = processing_job();
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let finalized = Arc::new(Mutex::new(Vec::new()));

        // Encode succeeds for clip 1 and fails for clip 2 of 3
        let calls = Arc::new(Mutex::new(0_u32));
        let mut encoder = MockClipEncoder::new();
        encoder.expect_cut().returning(move |_, _, _| {
            let mut calls = calls.lock().unwrap();
            *calls += 1;
            if *calls == 2 {
                Err(WorkerError::Media(
                    peakclip_media::MediaError::ffmpeg_failed("boom", Some(1)),
                ))
            } else {
                Ok(())
            }
        });
        encoder.expect_burn().returning(|_, _, _| Ok(()));

        let controller = JobController::new(
            ok_fetcher(),
            analyzer_with(vec![
                Segment::new(0.0, 60.0),
                Segment::new(100.0, 60.0),
                Segment::new(200.0, 60.0),
            ]),
            encoder,
            quiet_transcriber(),
            ok_storage(),
            recording_store(job.clone(), Arc::clone(&recorded), Arc::clone(&finalized)),
            test_config(),
        );

        let outcome = controller.run_once().await.unwrap().unwrap();
        assert_eq!(outcome.status, JobStatus::Error);
        // The outcome reports the clip produced before the failure
        assert_eq!(outcome.clips, 1);

        // Clip 1 was recorded before the failure; 2 and 3 never were
        let idxs: Vec<u32> = recorded.lock().unwrap().iter().map(|c| c.idx).collect();
        assert_eq!(idxs, vec![1]);

        // Finalized exactly once, as error
        let finalized = finalized.lock().unwrap();
        assert_eq!(finalized.len(), 1);
        assert_eq!(finalized[0].1, JobStatus::Error);
    }

    #[tokio::test]
    async fn test_download_failure_finalizes_error() {
        let job = processing_job();
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let finalized = Arc::new(Mutex::new(Vec::new()));

        let mut fetcher = MockMediaFetcher::new();
        fetcher.expect_fetch().returning(|_, _| {
            Err(WorkerError::Media(
                peakclip_media::MediaError::download_failed("unavailable"),
            ))
        });

        let mut analyzer = MockHighlightAnalyzer::new();
        analyzer.expect_analyze().times(0);

        let controller = JobController::new(
            fetcher,
            analyzer,
            MockClipEncoder::new(),
            MockTranscriber::new(),
            MockClipStorage::new(),
            recording_store(job, Arc::clone(&recorded), Arc::clone(&finalized)),
            test_config(),
        );

        let outcome = controller.run_once().await.unwrap().unwrap();
        assert_eq!(outcome.status, JobStatus::Error);
        assert!(recorded.lock().unwrap().is_empty());
        assert_eq!(finalized.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_pending_jobs_is_clean_noop() {
        let mut store = MockJobStore::new();
        store.expect_claim_next().times(1).returning(|| Ok(None));
        store.expect_finalize_job().times(0);

        let controller = JobController::new(
            MockMediaFetcher::new(),
            MockHighlightAnalyzer::new(),
            MockClipEncoder::new(),
            MockTranscriber::new(),
            MockClipStorage::new(),
            store,
            test_config(),
        );

        let outcome = controller.run_once().await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_empty_segment_list_falls_back_to_default() {
        let job = processing_job();
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let finalized = Arc::new(Mutex::new(Vec::new()));

        let controller = JobController::new(
            ok_fetcher(),
            analyzer_with(Vec::new()),
            ok_encoder(),
            quiet_transcriber(),
            ok_storage(),
            recording_store(job, Arc::clone(&recorded), Arc::clone(&finalized)),
            test_config(),
        );

        let outcome = controller.run_once().await.unwrap().unwrap();
        assert_eq!(outcome.status, JobStatus::Done);
        assert_eq!(outcome.clips, 1);
        assert_eq!(recorded.lock().unwrap()[0].idx, 1);
    }

    #[tokio::test]
    async fn test_ad_hoc_url_inserts_then_claims() {
        let job = processing_job();
        let inserted = Arc::new(Mutex::new(Vec::new()));
        let inserted_urls = Arc::clone(&inserted);

        let pending = Job::new("https://example.com/adhoc");
        let mut store = MockJobStore::new();
        store
            .expect_insert_job()
            .times(1)
            .returning(move |url| {
                inserted_urls.lock().unwrap().push(url.to_string());
                Ok(pending.clone())
            });
        store
            .expect_claim_next()
            .times(1)
            .returning(move || Ok(Some(job.clone())));
        store.expect_record_clip().returning(|_| Ok(()));
        store.expect_finalize_job().times(1).returning(|_, _| Ok(()));

        let config = WorkerConfig {
            source_url: Some("https://example.com/adhoc".to_string()),
            ..test_config()
        };

        let controller = JobController::new(
            ok_fetcher(),
            analyzer_with(vec![Segment::new(0.0, 60.0)]),
            ok_encoder(),
            quiet_transcriber(),
            ok_storage(),
            store,
            config,
        );

        let outcome = controller.run_once().await.unwrap().unwrap();
        assert_eq!(outcome.status, JobStatus::Done);
        assert_eq!(
            inserted.lock().unwrap().as_slice(),
            ["https://example.com/adhoc"]
        );
    }
}
