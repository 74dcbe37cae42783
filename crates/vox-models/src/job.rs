//! Video job records and the job status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::persona::Persona;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is queued waiting for a worker
    #[default]
    Queued,
    /// Job is actively being processed
    Processing,
    /// Job completed successfully
    Completed,
    /// Job failed with an error
    Failed,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// References to the published outputs of a job.
///
/// Every field except `dialogue_text` is optional: the pipeline always
/// delivers the best artifacts it could produce (script only, script plus
/// audio, or the full composed video).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobResultRefs {
    /// Signed URL for the composed output video
    pub video_url: Option<String>,
    /// Signed URL for the merged voiceover audio
    pub audio_url: Option<String>,
    /// Public URL for the thumbnail (first sampled frame)
    pub thumbnail_url: Option<String>,
    /// Raw generated dialogue script text
    pub dialogue_text: String,
    /// Number of speakable lines parsed from the script
    pub line_count: usize,
    /// Human-readable outcome summary
    pub status_message: String,
}

/// A commentary generation job as stored in the metadata store.
///
/// Created on submission with status `queued`; mutated only by the
/// orchestrator afterwards. `completed` and `failed` are terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoJob {
    /// Unique job ID
    pub job_id: JobId,

    /// Source video URL
    pub source_video_url: String,

    /// Personas speaking in the generated commentary
    pub personas: Vec<Persona>,

    /// Speech rate multiplier applied to synthesized audio
    pub speaking_pace: f32,

    /// Optional free-form guidance for dialogue generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_guidance: Option<String>,

    /// Caller-supplied seed summary, used when transcription is unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_summary: Option<String>,

    /// Job status
    #[serde(default)]
    pub status: JobStatus,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Published result references (if completed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResultRefs>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl VideoJob {
    /// Create a new queued job.
    pub fn new(source_video_url: impl Into<String>, personas: Vec<Persona>) -> Self {
        let now = Utc::now();
        Self {
            job_id: JobId::new(),
            source_video_url: source_video_url.into(),
            personas,
            speaking_pace: 1.0,
            user_guidance: None,
            transcript_summary: None,
            status: JobStatus::Queued,
            error_message: None,
            result: None,
            created_at: now,
            updated_at: now,
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

    /// Mark the job as picked up by a worker.
    pub fn start(mut self) -> Self {
        self.status = JobStatus::Processing;
        self.updated_at = Utc::now();
        self
    }

    /// Mark the job as completed with published results.
    pub fn complete(mut self, result: JobResultRefs) -> Self {
        self.status = JobStatus::Completed;
        self.result = Some(result);
        self.error_message = None;
        self.updated_at = Utc::now();
        self
    }

    /// Mark the job as failed with a captured error message.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.status = JobStatus::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_creation() {
        let job = VideoJob::new("https://youtube.com/watch?v=abc", vec![])
            .with_speaking_pace(1.2)
            .with_guidance("be kind");
        assert_eq!(job.status, JobStatus::Queued);
        assert!((job.speaking_pace - 1.2).abs() < f32::EPSILON);
        assert_eq!(job.user_guidance.as_deref(), Some("be kind"));
        assert!(job.result.is_none());
    }

    #[test]
    fn test_job_state_transitions() {
        let job = VideoJob::new("https://example.com", vec![]);

        let started = job.start();
        assert_eq!(started.status, JobStatus::Processing);
        assert!(!started.status.is_terminal());

        let completed = started.complete(JobResultRefs {
            video_url: Some("https://signed.example/video".into()),
            dialogue_text: "Alice: hi".into(),
            line_count: 1,
            status_message: "ok".into(),
            ..Default::default()
        });
        assert_eq!(completed.status, JobStatus::Completed);
        assert!(completed.status.is_terminal());
        assert!(completed.result.is_some());
        assert!(completed.error_message.is_none());
    }

    #[test]
    fn test_job_failure_captures_message() {
        let job = VideoJob::new("https://example.com", vec![]);
        let failed = job.fail("yt-dlp exited with status 1");
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(
            failed.error_message.as_deref(),
            Some("yt-dlp exited with status 1")
        );
    }

    #[test]
    fn test_status_serialization_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(JobStatus::Failed.as_str(), "failed");
    }
}
