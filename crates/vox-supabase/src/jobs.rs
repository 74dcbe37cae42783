//! Video job repository.

use chrono::Utc;
use serde_json::json;
use tracing::info;

use vox_models::{JobId, JobResultRefs, JobStatus, VideoJob};

use crate::client::SupabaseClient;
use crate::error::DbResult;
use crate::retry::{retry_async, RetryConfig};

/// Table holding job records.
const JOBS_TABLE: &str = "video_jobs";

/// Repository for job records.
///
/// Status writes are what the presentation layer polls, so the terminal
/// transitions are retried a few times before giving up.
#[derive(Clone)]
pub struct VideoJobRepository {
    client: SupabaseClient,
}

impl VideoJobRepository {
    /// Create a new repository.
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Fetch a job by ID.
    pub async fn get(&self, job_id: &JobId) -> DbResult<Option<VideoJob>> {
        self.client
            .select_one(JOBS_TABLE, "job_id", job_id.as_str())
            .await
    }

    /// Mark a job as picked up by a worker.
    pub async fn mark_processing(&self, job_id: &JobId) -> DbResult<()> {
        let changes = json!({
            "status": JobStatus::Processing.as_str(),
            "updated_at": Utc::now().to_rfc3339(),
        });
        self.client
            .update(JOBS_TABLE, "job_id", job_id.as_str(), &changes)
            .await?;
        info!(job_id = %job_id, "Job status updated to processing");
        Ok(())
    }

    /// Mark a job as completed with its published result references.
    pub async fn complete(&self, job_id: &JobId, result: &JobResultRefs) -> DbResult<()> {
        let changes = json!({
            "status": JobStatus::Completed.as_str(),
            "result": result,
            "error_message": serde_json::Value::Null,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let retry = RetryConfig::new("job_complete").with_max_retries(2);
        retry_async(&retry, || {
            self.client
                .update(JOBS_TABLE, "job_id", job_id.as_str(), &changes)
        })
        .await
        .into_result()?;

        info!(job_id = %job_id, "Job status updated to completed");
        Ok(())
    }

    /// Mark a job as failed with a captured error message.
    pub async fn fail(&self, job_id: &JobId, error_message: &str) -> DbResult<()> {
        let changes = json!({
            "status": JobStatus::Failed.as_str(),
            "error_message": error_message,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let retry = RetryConfig::new("job_fail").with_max_retries(2);
        retry_async(&retry, || {
            self.client
                .update(JOBS_TABLE, "job_id", job_id.as_str(), &changes)
        })
        .await
        .into_result()?;

        info!(job_id = %job_id, "Job status updated to failed");
        Ok(())
    }
}
