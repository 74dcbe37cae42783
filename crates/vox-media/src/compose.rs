//! Final video composition: clip video + voiceover audio.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Build the FFmpeg arguments for composition.
///
/// Maps the video stream from the clip and the audio stream from the
/// voiceover (the clip's own audio is never mapped), re-encodes to
/// H.264/AAC, and trims the output to exactly `target_duration_secs` so the
/// result always tracks narration length rather than clip length.
fn build_compose_args(
    video_input: &Path,
    audio_input: &Path,
    output: &Path,
    target_duration_secs: f64,
) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-i".to_string(),
        video_input.to_string_lossy().to_string(),
        "-i".to_string(),
        audio_input.to_string_lossy().to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "ultrafast".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-t".to_string(),
        format!("{:.3}", target_duration_secs),
        output.to_string_lossy().to_string(),
    ]
}

/// Compose the final video: clip visuals, voiceover audio, trimmed to the
/// voiceover duration.
pub async fn compose_video_with_audio(
    video_input: impl AsRef<Path>,
    audio_input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    target_duration_secs: f64,
) -> MediaResult<()> {
    let video_input = video_input.as_ref();
    let audio_input = audio_input.as_ref();
    let output = output.as_ref();

    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    if target_duration_secs <= 0.0 {
        return Err(MediaError::InvalidDuration(format!(
            "target duration must be positive, got {}",
            target_duration_secs
        )));
    }

    let args = build_compose_args(video_input, audio_input, output, target_duration_secs);
    debug!("Running FFmpeg compose: ffmpeg {}", args.join(" "));

    let result = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !result.status.success() {
        return Err(MediaError::ffmpeg_failed(
            "Composition failed",
            Some(String::from_utf8_lossy(&result.stderr).to_string()),
            result.status.code(),
        ));
    }

    info!(
        output = %output.display(),
        duration_secs = target_duration_secs,
        "Composed video with voiceover audio"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_output_duration_tracks_voiceover() {
        let args = build_compose_args(
            &PathBuf::from("clip.mp4"),
            &PathBuf::from("voiceover.wav"),
            &PathBuf::from("final.mp4"),
            12.345,
        );

        // Trim flag carries the audio duration, not the clip duration
        assert!(args.windows(2).any(|w| w[0] == "-t" && w[1] == "12.345"));
    }

    #[test]
    fn test_original_audio_is_never_mapped() {
        let args = build_compose_args(
            &PathBuf::from("clip.mp4"),
            &PathBuf::from("voiceover.wav"),
            &PathBuf::from("final.mp4"),
            30.0,
        );

        let maps: Vec<&String> = args
            .windows(2)
            .filter(|w| w[0] == "-map")
            .map(|w| &w[1])
            .collect();
        assert_eq!(maps, vec!["0:v:0", "1:a:0"]);
    }
}
