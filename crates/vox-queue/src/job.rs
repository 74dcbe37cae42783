//! Job payload delivered through the work queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vox_models::{JobId, Persona};

/// Job to generate a commentary video for a source URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateVideoJob {
    /// Unique job ID
    pub job_id: JobId,
    /// Source video URL
    pub video_url: String,
    /// Personas speaking in the commentary
    pub personas: Vec<Persona>,
    /// Speech rate multiplier
    #[serde(default = "default_speaking_pace")]
    pub speaking_pace: f32,
    /// Optional free-form guidance for the dialogue writer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_guidance: Option<String>,
    /// Caller-supplied seed summary used when transcription is unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_summary: Option<String>,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

fn default_speaking_pace() -> f32 {
    1.0
}

impl GenerateVideoJob {
    /// Create a new job.
    pub fn new(video_url: impl Into<String>, personas: Vec<Persona>) -> Self {
        Self {
            job_id: JobId::new(),
            video_url: video_url.into(),
            personas,
            speaking_pace: default_speaking_pace(),
            user_guidance: None,
            transcript_summary: None,
            created_at: Utc::now(),
        }
    }

    /// Set the speaking pace multiplier.
    pub fn with_speaking_pace(mut self, pace: f32) -> Self {
        self.speaking_pace = pace;
        self
    }

    /// Set user guidance.
    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.user_guidance = Some(guidance.into());
        self
    }

    /// Set a seed transcript summary.
    pub fn with_transcript_summary(mut self, summary: impl Into<String>) -> Self {
        self.transcript_summary = Some(summary.into());
        self
    }

    /// Generate idempotency key for enqueue-side deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("generate:{}", self.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_roundtrip() {
        let job = GenerateVideoJob::new(
            "https://youtube.com/watch?v=dQw4w9WgXcQ",
            vec![Persona::named("Alice"), Persona::named("Bob")],
        )
        .with_speaking_pace(1.2)
        .with_guidance("keep it gentle");

        let json = serde_json::to_string(&job).unwrap();
        let back: GenerateVideoJob = serde_json::from_str(&json).unwrap();
        assert_eq!(back.job_id, job.job_id);
        assert_eq!(back.personas.len(), 2);
        assert!((back.speaking_pace - 1.2).abs() < f32::EPSILON);
        assert_eq!(back.user_guidance.as_deref(), Some("keep it gentle"));
    }

    #[test]
    fn test_missing_pace_defaults_to_one() {
        let json = r#"{
            "job_id": "job-1",
            "video_url": "https://youtu.be/dQw4w9WgXcQ",
            "personas": [],
            "created_at": "2025-01-01T00:00:00Z"
        }"#;
        let job: GenerateVideoJob = serde_json::from_str(json).unwrap();
        assert!((job.speaking_pace - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_idempotency_key_is_job_scoped() {
        let a = GenerateVideoJob::new("https://youtu.be/x", vec![]);
        let b = GenerateVideoJob::new("https://youtu.be/x", vec![]);
        assert_ne!(a.idempotency_key(), b.idempotency_key());
    }
}
