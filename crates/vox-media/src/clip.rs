//! Bounded-duration clip creation.

use std::path::Path;
use tracing::{info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::download::download_video;
use crate::error::MediaResult;

/// Re-encode a bounded-duration clip from a local video file.
///
/// The clip is always re-encoded to H.264/AAC so that later muxing is
/// reliable regardless of what the source delivered.
///
/// # Arguments
/// * `input` - Path to the source video
/// * `output` - Path for the clipped video
/// * `start_secs` - Start offset into the source
/// * `max_duration_secs` - Upper bound on the clip duration
pub async fn clip_video(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start_secs: f64,
    max_duration_secs: f64,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    info!(
        "Clipping {} -> {} (start: {:.1}s, max duration: {:.1}s)",
        input.display(),
        output.display(),
        start_secs,
        max_duration_secs
    );

    let cmd = FfmpegCommand::new(input, output)
        .seek(start_secs)
        .duration(max_duration_secs)
        .video_codec("libx264")
        .preset("ultrafast")
        .audio_codec("aac")
        .audio_bitrate("192k");

    FfmpegRunner::new().run(&cmd).await?;

    info!("Clip created: {}", output.display());
    Ok(())
}

/// Download a source video and produce a bounded-duration re-encoded clip.
///
/// The full download is written next to the clip with a `download_` prefix
/// and removed once clipping finishes, on success or failure.
pub async fn download_and_clip_video(
    url: &str,
    output: impl AsRef<Path>,
    start_secs: f64,
    max_duration_secs: f64,
) -> MediaResult<()> {
    let output = output.as_ref();
    let file_name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "clip.mp4".to_string());
    let download_path = output.with_file_name(format!("download_{}", file_name));

    download_video(url, &download_path).await?;

    let result = clip_video(&download_path, output, start_secs, max_duration_secs).await;

    if let Err(e) = tokio::fs::remove_file(&download_path).await {
        warn!(
            "Could not delete full download {}: {}",
            download_path.display(),
            e
        );
    }

    result
}
