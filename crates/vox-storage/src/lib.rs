//! Cloudflare R2 storage client.
//!
//! This crate provides:
//! - File and byte upload/download against the S3 API
//! - Presigned URL generation for time-bounded access
//! - The publication key scheme for job outputs, cached source assets,
//!   and public thumbnails

pub mod client;
pub mod error;
pub mod publish;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use publish::{
    cache_clip_key, cache_frame_key, job_audio_key, job_video_key, thumbnail_key, PublishConfig,
};
