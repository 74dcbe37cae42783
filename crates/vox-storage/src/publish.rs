//! Publication key scheme and signed/public URL helpers.
//!
//! Job outputs live under `jobs/{job_id}/` and are handed out through
//! time-bounded presigned URLs. Cached source assets live under
//! `video_cache/{identifier}/`. Thumbnails go to a public-read prefix and
//! are addressed through a public base URL.

use std::time::Duration;

use crate::error::{StorageError, StorageResult};

/// Default signed URL lifetime: 24 hours.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Key for a job's composed output video.
pub fn job_video_key(job_id: &str) -> String {
    format!("jobs/{}/final_video.mp4", job_id)
}

/// Key for a job's merged voiceover audio.
pub fn job_audio_key(job_id: &str) -> String {
    format!("jobs/{}/voiceover.wav", job_id)
}

/// Key for the cached bounded-duration source clip of a video identifier.
pub fn cache_clip_key(identifier: &str) -> String {
    format!("video_cache/{}/source_clip.mp4", identifier)
}

/// Key for a cached sampled frame of a video identifier.
pub fn cache_frame_key(identifier: &str, file_name: &str) -> String {
    format!("video_cache/{}/frames/{}", identifier, file_name)
}

/// Key for a public thumbnail.
pub fn thumbnail_key(id: &str) -> String {
    format!("thumbnails/{}.jpg", id)
}

/// Publication settings.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Lifetime of presigned GET URLs
    pub signed_url_ttl: Duration,
    /// Public base URL for the public-read prefix (thumbnails)
    pub public_url_base: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            signed_url_ttl: DEFAULT_SIGNED_URL_TTL,
            public_url_base: None,
        }
    }
}

impl PublishConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let signed_url_ttl = std::env::var("SIGNED_URL_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SIGNED_URL_TTL);

        Self {
            signed_url_ttl,
            public_url_base: std::env::var("R2_PUBLIC_URL_BASE").ok(),
        }
    }

    /// Build the public URL for a key under the public-read prefix.
    pub fn public_url(&self, key: &str) -> StorageResult<String> {
        let base = self.public_url_base.as_deref().ok_or_else(|| {
            StorageError::config_error("R2_PUBLIC_URL_BASE not set; cannot build public URL")
        })?;
        Ok(format!("{}/{}", base.trim_end_matches('/'), key))
    }
}
