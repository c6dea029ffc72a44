//! Source media download using yt-dlp.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Download timeout. Expiry is treated as a fetch failure for the job.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(1800);

/// Download a VOD to a local file.
///
/// Prefers an MP4 rendition; when none is available falls back to the
/// best format yt-dlp can find.
pub async fn download_vod(url: &str, output_path: impl AsRef<Path>) -> MediaResult<()> {
    let output_path = output_path.as_ref();

    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

    info!(url, output = %output_path.display(), "Downloading VOD");

    match run_ytdlp(url, output_path, "mp4/best").await {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!(error = %e, "MP4 download failed, retrying with best format");
            run_ytdlp(url, output_path, "best").await
        }
    }
}

async fn run_ytdlp(url: &str, output_path: &Path, format: &str) -> MediaResult<()> {
    let output_path_str = output_path.to_string_lossy();
    let args = ["-o", output_path_str.as_ref(), "-f", format, url];

    debug!("Running yt-dlp {}", args.join(" "));

    let output = tokio::time::timeout(
        DOWNLOAD_TIMEOUT,
        Command::new("yt-dlp")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| MediaError::Timeout(DOWNLOAD_TIMEOUT.as_secs()))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::download_failed(stderr.trim().to_string()));
    }

    if !output_path.exists() {
        return Err(MediaError::download_failed(format!(
            "yt-dlp reported success but {} was not written",
            output_path.display()
        )));
    }

    Ok(())
}
