//! Per-segment clip pipeline.
//!
//! Drives cut -> transcribe -> caption -> burn -> publish -> record for
//! one selected segment. Stateless across segments apart from the
//! shared job workspace; any step failure aborts this segment and is
//! surfaced to the controller.

use std::path::Path;

use tracing::info;

use peakclip_models::{render_srt, ClipRecord, JobId, Segment};

use crate::error::WorkerResult;
use crate::hooks::make_hook;
use crate::services::{ClipEncoder, ClipStorage, JobStore, Transcriber};

/// Produce, caption, publish, and record one clip.
///
/// The clip row is written only after the upload succeeded, so a
/// recorded clip always has a published object behind it.
pub async fn produce_clip<E, T, O, S>(
    encoder: &E,
    transcriber: &T,
    storage: &O,
    store: &S,
    workspace: &Path,
    source: &Path,
    segment: Segment,
    job_id: &JobId,
    idx: u32,
) -> WorkerResult<ClipRecord>
where
    E: ClipEncoder,
    T: Transcriber,
    O: ClipStorage,
    S: JobStore,
{
    info!(
        job_id = %job_id,
        idx,
        start = segment.start_secs,
        duration = segment.duration_secs,
        "Producing clip"
    );

    let raw = workspace.join(format!("clip_{}_raw.mp4", idx));
    encoder.cut(source, segment, &raw).await?;

    // Whisper runs on the cut clip, so cue times are already clip-zero
    // based; negative times are clamped on conversion. An empty
    // transcript (silent clip) flows through.
    let cues = transcriber.transcribe(&raw, workspace).await?;
    let transcript = cues
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let hook = make_hook(&transcript);

    let srt_path = workspace.join(format!("clip_{}.srt", idx));
    tokio::fs::write(&srt_path, render_srt(&cues)).await?;

    let captioned = workspace.join(format!("clip_{}_captioned.mp4", idx));
    encoder.burn(&raw, &srt_path, &captioned).await?;

    let key = ClipRecord::storage_key(job_id, idx);
    storage.put_clip(&captioned, &key).await?;

    let clip = ClipRecord::new(job_id.clone(), idx, hook);
    store.record_clip(&clip).await?;

    info!(job_id = %job_id, idx, key = %clip.path, "Clip published");
    Ok(clip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use peakclip_models::SubtitleCue;

    use crate::error::WorkerError;
    use crate::services::{MockClipEncoder, MockClipStorage, MockJobStore, MockTranscriber};

    fn cues_for(text: &str) -> Vec<SubtitleCue> {
        vec![SubtitleCue::from_transcription(1, 0.0, 2.0, text)]
    }

    #[tokio::test]
    async fn test_happy_path_records_after_upload() {
        let workspace = tempfile::tempdir().unwrap();
        let job_id = JobId::from_string("job-1");

        let mut encoder = MockClipEncoder::new();
        encoder.expect_cut().times(1).returning(|_, _, _| Ok(()));
        encoder.expect_burn().times(1).returning(|_, _, _| Ok(()));

        let mut transcriber = MockTranscriber::new();
        transcriber
            .expect_transcribe()
            .times(1)
            .returning(|_, _| Ok(cues_for("Did we just win the match?")));

        let uploaded = Arc::new(Mutex::new(Vec::new()));
        let uploaded_keys = Arc::clone(&uploaded);
        let mut storage = MockClipStorage::new();
        storage.expect_put_clip().times(1).returning(move |_, key| {
            uploaded_keys.lock().unwrap().push(key.to_string());
            Ok(())
        });

        let recorded = Arc::new(Mutex::new(Vec::new()));
        let recorded_clips = Arc::clone(&recorded);
        let mut store = MockJobStore::new();
        store.expect_record_clip().times(1).returning(move |clip| {
            recorded_clips.lock().unwrap().push(clip.clone());
            Ok(())
        });

        let clip = produce_clip(
            &encoder,
            &transcriber,
            &storage,
            &store,
            workspace.path(),
            &workspace.path().join("vod.mp4"),
            Segment::new(0.0, 60.0),
            &job_id,
            1,
        )
        .await
        .unwrap();

        assert_eq!(clip.idx, 1);
        assert_eq!(clip.path, "job-1/clip_1.mp4");
        assert_eq!(clip.hook, "Did we just win the match?");
        assert_eq!(uploaded.lock().unwrap().as_slice(), ["job-1/clip_1.mp4"]);
        assert_eq!(recorded.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_encode_failure_skips_later_steps() {
        let workspace = tempfile::tempdir().unwrap();
        let job_id = JobId::from_string("job-1");

        let mut encoder = MockClipEncoder::new();
        encoder.expect_cut().times(1).returning(|_, _, _| {
            Err(WorkerError::Media(
                peakclip_media::MediaError::ffmpeg_failed("encode blew up", Some(1)),
            ))
        });
        encoder.expect_burn().times(0);

        let mut transcriber = MockTranscriber::new();
        transcriber.expect_transcribe().times(0);
        let mut storage = MockClipStorage::new();
        storage.expect_put_clip().times(0);
        let mut store = MockJobStore::new();
        store.expect_record_clip().times(0);

        let result = produce_clip(
            &encoder,
            &transcriber,
            &storage,
            &store,
            workspace.path(),
            &workspace.path().join("vod.mp4"),
            Segment::new(10.0, 60.0),
            &job_id,
            2,
        )
        .await;

        assert!(matches!(result, Err(WorkerError::Media(_))));
    }

    #[tokio::test]
    async fn test_empty_transcript_flows_through() {
        let workspace = tempfile::tempdir().unwrap();
        let job_id = JobId::from_string("job-2");

        let mut encoder = MockClipEncoder::new();
        encoder.expect_cut().returning(|_, _, _| Ok(()));
        encoder.expect_burn().returning(|_, _, _| Ok(()));

        let mut transcriber = MockTranscriber::new();
        transcriber.expect_transcribe().returning(|_, _| Ok(vec![]));

        let mut storage = MockClipStorage::new();
        storage.expect_put_clip().returning(|_, _| Ok(()));

        let mut store = MockJobStore::new();
        store.expect_record_clip().returning(|_| Ok(()));

        let clip = produce_clip(
            &encoder,
            &transcriber,
            &storage,
            &store,
            workspace.path(),
            &workspace.path().join("vod.mp4"),
            Segment::new(0.0, 60.0),
            &job_id,
            1,
        )
        .await
        .unwrap();

        // Silent clip still gets the default template hook
        assert_eq!(clip.hook, "He didn’t expect THIS…");

        // And an (empty) subtitle file was written for the burn step
        let srt = std::fs::read_to_string(workspace.path().join("clip_1.srt")).unwrap();
        assert!(srt.is_empty());
    }
}
