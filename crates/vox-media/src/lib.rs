//! FFmpeg and yt-dlp CLI wrappers for the VoxOver pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and execution
//! - Source video download via yt-dlp
//! - Bounded-duration re-encoded clipping
//! - Frame sampling at a fixed interval
//! - Audio extraction/compression and lossless concat merging
//! - Video/voiceover muxing trimmed to the voiceover duration
//! - Duration probing via ffprobe

pub mod audio;
pub mod clip;
pub mod command;
pub mod compose;
pub mod download;
pub mod error;
pub mod frames;
pub mod probe;

pub use audio::{extract_compressed_audio, merge_wav_buffers};
pub use clip::{clip_video, download_and_clip_video};
pub use command::{check_ffmpeg, check_ffprobe, check_ytdlp, FfmpegCommand, FfmpegRunner};
pub use compose::compose_video_with_audio;
pub use download::{download_video, is_supported_url};
pub use error::{MediaError, MediaResult};
pub use frames::sample_frames;
pub use probe::probe_duration;
