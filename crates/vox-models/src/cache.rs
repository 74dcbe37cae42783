//! Cached video asset records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Assets computed once per unique source video and reused across jobs.
///
/// At most one row exists per `source_video_identifier`; the row is written
/// once on the first successful processing of a new identifier and is
/// read-mostly afterwards, with `last_accessed_at` bumped best-effort on
/// each hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedVideoAsset {
    /// Canonical video identifier (unique cache key)
    pub source_video_identifier: String,

    /// Object storage key of the bounded-duration source clip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clipped_video_key: Option<String>,

    /// Transcript of the clip audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_transcript: Option<String>,

    /// Vision description of the sampled frames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_descriptions: Option<String>,

    /// Object storage keys of the sampled frames, in chronological order
    #[serde(default)]
    pub frame_keys: Vec<String>,

    /// When the assets were first computed
    pub processed_at: DateTime<Utc>,

    /// When the entry was last read by a job
    pub last_accessed_at: DateTime<Utc>,
}

impl CachedVideoAsset {
    /// Create a new entry for an identifier, stamped now.
    pub fn new(source_video_identifier: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            source_video_identifier: source_video_identifier.into(),
            clipped_video_key: None,
            audio_transcript: None,
            frame_descriptions: None,
            frame_keys: Vec::new(),
            processed_at: now,
            last_accessed_at: now,
        }
    }

    /// True when the entry carries both text assets downstream stages need.
    pub fn has_text_assets(&self) -> bool {
        self.audio_transcript.is_some() && self.frame_descriptions.is_some()
    }
}
