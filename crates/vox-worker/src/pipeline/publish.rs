//! Asset publication: uploads, signed URLs, and the public thumbnail.

use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use vox_models::JobId;
use vox_storage::{job_audio_key, job_video_key, thumbnail_key};

use crate::deps::PipelineContext;
use crate::error::{WorkerError, WorkerResult};

/// Upload the composed video and return its signed URL.
///
/// The video is the job's primary deliverable; a failure here fails the job
/// with a descriptive message.
pub async fn upload_video(
    ctx: &PipelineContext,
    job_id: &JobId,
    path: &Path,
) -> WorkerResult<String> {
    let key = job_video_key(job_id.as_str());

    ctx.storage
        .upload_file(path, &key, "video/mp4")
        .await
        .map_err(|e| WorkerError::publication_failed(format!("final video upload failed: {}", e)))?;

    let url = ctx
        .storage
        .presign_get(&key, ctx.publish.signed_url_ttl)
        .await
        .map_err(|e| {
            WorkerError::publication_failed(format!("could not sign final video URL: {}", e))
        })?;

    info!(job_id = %job_id, key = %key, "Published final video");
    Ok(url)
}

/// Upload the merged voiceover and return its signed URL; failure only
/// degrades the result references.
pub async fn upload_audio(ctx: &PipelineContext, job_id: &JobId, path: &Path) -> Option<String> {
    let key = job_audio_key(job_id.as_str());

    if let Err(e) = ctx.storage.upload_file(path, &key, "audio/wav").await {
        warn!(job_id = %job_id, error = %e, "Voiceover upload failed");
        return None;
    }

    match ctx.storage.presign_get(&key, ctx.publish.signed_url_ttl).await {
        Ok(url) => {
            info!(job_id = %job_id, key = %key, "Published voiceover audio");
            Some(url)
        }
        Err(e) => {
            warn!(job_id = %job_id, error = %e, "Could not sign voiceover URL");
            None
        }
    }
}

/// Upload the first sampled frame as a public thumbnail; optional.
pub async fn upload_thumbnail(
    ctx: &PipelineContext,
    job_id: &JobId,
    frame_path: &Path,
) -> Option<String> {
    let bytes = match tokio::fs::read(frame_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(job_id = %job_id, error = %e, "Could not read thumbnail frame");
            return None;
        }
    };

    let key = thumbnail_key(&Uuid::new_v4().to_string());
    if let Err(e) = ctx.storage.upload_bytes(bytes, &key, "image/jpeg").await {
        warn!(job_id = %job_id, error = %e, "Thumbnail upload failed");
        return None;
    }

    match ctx.publish.public_url(&key) {
        Ok(url) => {
            info!(job_id = %job_id, key = %key, "Published thumbnail");
            Some(url)
        }
        Err(e) => {
            warn!(job_id = %job_id, error = %e, "No public base URL for thumbnail");
            None
        }
    }
}
