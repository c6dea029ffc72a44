//! Clip cutting, vertical formatting, and subtitle burn-in.

use std::path::Path;
use tracing::info;

use peakclip_models::Segment;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Output frame: 1080x1920 portrait, scale-to-fit then center-pad.
const VERTICAL_FILTER: &str = "scale=1080:1920:force_original_aspect_ratio=decrease,\
pad=1080:1920:(ow-iw)/2:(oh-ih)/2,format=yuv420p";

/// Subtitle render style for burned-in captions.
const SUBTITLE_STYLE: &str = "FontName=Inter,Fontsize=48,MarginV=96,Outline=4";

/// Cut a segment out of the source and reformat it to a 9:16 vertical
/// frame (1080x1920, 30fps, H.264 + AAC).
pub async fn cut_and_format(
    source: impl AsRef<Path>,
    segment: Segment,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let source = source.as_ref();
    let output = output.as_ref();

    info!(
        source = %source.display(),
        output = %output.display(),
        start = segment.start_secs,
        duration = segment.duration_secs,
        "Cutting vertical clip"
    );

    let cmd = FfmpegCommand::new(source, output)
        .seek(segment.start_secs)
        .duration(segment.duration_secs)
        .video_filter(VERTICAL_FILTER)
        .frame_rate(30)
        .video_codec("libx264")
        .preset("veryfast")
        .crf(22)
        .audio_codec("aac")
        .audio_bitrate("128k");

    FfmpegRunner::new().run(&cmd).await
}

/// Hard-render a subtitle file onto a clip with a fixed readable
/// style; the audio stream is copied unchanged.
pub async fn burn_subtitles(
    input: impl AsRef<Path>,
    srt_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let input = input.as_ref();
    let srt_path = srt_path.as_ref();
    let output = output.as_ref();

    info!(
        input = %input.display(),
        subtitles = %srt_path.display(),
        "Burning subtitles"
    );

    let filter = format!(
        "subtitles={}:force_style='{}'",
        srt_path.to_string_lossy(),
        SUBTITLE_STYLE
    );

    let cmd = FfmpegCommand::new(input, output)
        .video_filter(filter)
        .audio_codec("copy");

    FfmpegRunner::new().run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_args_carry_encode_settings() {
        let cmd = FfmpegCommand::new("vod.mp4", "clip.mp4")
            .seek(40.0)
            .duration(60.0)
            .video_filter(VERTICAL_FILTER)
            .frame_rate(30)
            .video_codec("libx264");

        let args = cmd.build_args();
        assert!(args.iter().any(|a| a.contains("scale=1080:1920")));
        assert!(args.contains(&"-r".to_string()));
        assert!(args.contains(&"30".to_string()));
    }

    #[test]
    fn test_burn_filter_includes_style() {
        let filter = format!(
            "subtitles={}:force_style='{}'",
            "clip_1.srt", SUBTITLE_STYLE
        );
        assert!(filter.contains("FontName=Inter"));
        assert!(filter.contains("MarginV=96"));
    }
}
