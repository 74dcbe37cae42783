//! Frame sampling at a fixed interval.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Sample frames from a video at a fixed interval.
///
/// Writes `frame_0001.jpg`, `frame_0002.jpg`, ... into `frames_dir` and
/// returns their paths sorted chronologically. An empty result is not an
/// error; very short clips may yield a single frame.
///
/// # Arguments
/// * `input` - Path to the video file
/// * `frames_dir` - Directory to write the frames into (created if missing)
/// * `interval_secs` - One frame every `interval_secs` seconds
pub async fn sample_frames(
    input: impl AsRef<Path>,
    frames_dir: impl AsRef<Path>,
    interval_secs: u32,
) -> MediaResult<Vec<PathBuf>> {
    let input = input.as_ref();
    let frames_dir = frames_dir.as_ref();

    tokio::fs::create_dir_all(frames_dir).await?;

    let pattern = frames_dir.join("frame_%04d.jpg");
    let cmd = FfmpegCommand::new(input, &pattern)
        .video_filter(format!("fps=1/{}", interval_secs))
        .output_args(["-qscale:v", "2"]);

    FfmpegRunner::new().run(&cmd).await?;

    let mut frames = Vec::new();
    let mut entries = tokio::fs::read_dir(frames_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("frame_") && name.ends_with(".jpg") {
            frames.push(entry.path());
        }
    }
    frames.sort();

    if frames.is_empty() {
        warn!(
            "No frames were sampled from {}; check the clip duration",
            input.display()
        );
    } else {
        info!(
            "Sampled {} frames from {} into {}",
            frames.len(),
            input.display(),
            frames_dir.display()
        );
    }

    Ok(frames)
}
