//! Audio extraction, compression, and lossless concat merging.

use std::path::Path;
use tracing::{info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Extract and compress a video's audio track for transcription.
///
/// Encodes mono 24 kHz MP3 at 64 kbps to stay well under speech-to-text
/// upload ceilings for bounded-duration clips.
pub async fn extract_compressed_audio(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    let cmd = FfmpegCommand::new(input, output)
        .no_video()
        .output_args(["-acodec", "libmp3lame"])
        .audio_bitrate("64k")
        .audio_rate(24000)
        .audio_channels(1);

    FfmpegRunner::new().run(&cmd).await?;

    info!(
        "Extracted compressed audio from {} to {}",
        input.display(),
        output.display()
    );
    Ok(())
}

/// Concatenate WAV buffers losslessly into one file.
///
/// Writes each buffer to `scratch_dir`, builds a concat demuxer file list,
/// and stream-copies (`-c copy`) into `output`. All inputs must share one
/// format; a mismatch surfaces as an FFmpeg failure of this merge, distinct
/// from any upstream synthesis error. Scratch files are removed before
/// returning on every path.
pub async fn merge_wav_buffers(
    buffers: &[Vec<u8>],
    scratch_dir: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    if buffers.is_empty() {
        return Err(MediaError::NothingToMerge);
    }

    let scratch_dir = scratch_dir.as_ref();
    let output = output.as_ref();
    tokio::fs::create_dir_all(scratch_dir).await?;

    let mut part_paths = Vec::with_capacity(buffers.len());
    for (i, buffer) in buffers.iter().enumerate() {
        let part_path = scratch_dir.join(format!("audio_{}.wav", i));
        tokio::fs::write(&part_path, buffer).await?;
        part_paths.push(part_path);
    }

    let file_list_path = scratch_dir.join("filelist.txt");
    let file_list = part_paths
        .iter()
        .map(|p| format!("file '{}'", p.to_string_lossy()))
        .collect::<Vec<_>>()
        .join("\n");
    tokio::fs::write(&file_list_path, file_list).await?;

    let cmd = FfmpegCommand::new(&file_list_path, output)
        .input_args(["-f", "concat", "-safe", "0"])
        .output_args(["-c", "copy"]);

    let result = FfmpegRunner::new().run(&cmd).await;

    for path in part_paths.iter().chain(std::iter::once(&file_list_path)) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("Could not delete merge scratch file {}: {}", path.display(), e);
        }
    }

    result?;

    info!(
        "Merged {} audio buffers into {}",
        buffers.len(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_rejects_empty_input() {
        let result = tokio_test::block_on(merge_wav_buffers(
            &[],
            std::env::temp_dir(),
            std::env::temp_dir().join("merged.wav"),
        ));
        assert!(matches!(result, Err(MediaError::NothingToMerge)));
    }

    #[test]
    fn test_concat_command_stream_copies() {
        let cmd = FfmpegCommand::new("filelist.txt", "merged.wav")
            .input_args(["-f", "concat", "-safe", "0"])
            .output_args(["-c", "copy"]);

        let args = cmd.build_args();
        let f = args.iter().position(|a| a == "-f").unwrap();
        let i = args.iter().position(|a| a == "-i").unwrap();
        assert!(f < i, "concat demuxer flags must precede the input");
        assert!(args.windows(2).any(|w| w[0] == "-c" && w[1] == "copy"));
    }

    #[test]
    fn test_compressed_audio_targets_small_output() {
        let cmd = FfmpegCommand::new("clip.mp4", "audio.mp3")
            .no_video()
            .output_args(["-acodec", "libmp3lame"])
            .audio_bitrate("64k")
            .audio_rate(24000)
            .audio_channels(1);

        let args = cmd.build_args();
        assert!(args.contains(&"-vn".to_string()));
        assert!(args.windows(2).any(|w| w[0] == "-b:a" && w[1] == "64k"));
        assert!(args.windows(2).any(|w| w[0] == "-ar" && w[1] == "24000"));
    }
}
