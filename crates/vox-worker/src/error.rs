//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Acquisition failed: {0}")]
    AcquisitionFailed(String),

    #[error("Composition failed: {0}")]
    CompositionFailed(String),

    #[error("Dialogue generation failed: {0}")]
    DialogueFailed(String),

    #[error("Publication failed: {0}")]
    PublicationFailed(String),

    #[error("Media error: {0}")]
    Media(#[from] vox_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] vox_storage::StorageError),

    #[error("Metadata store error: {0}")]
    Db(#[from] vox_supabase::DbError),

    #[error("AI service error: {0}")]
    Ai(#[from] vox_ai::AiError),

    #[error("Queue error: {0}")]
    Queue(#[from] vox_queue::QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn acquisition_failed(msg: impl Into<String>) -> Self {
        Self::AcquisitionFailed(msg.into())
    }

    pub fn composition_failed(msg: impl Into<String>) -> Self {
        Self::CompositionFailed(msg.into())
    }

    pub fn dialogue_failed(msg: impl Into<String>) -> Self {
        Self::DialogueFailed(msg.into())
    }

    pub fn publication_failed(msg: impl Into<String>) -> Self {
        Self::PublicationFailed(msg.into())
    }
}
