//! Source asset stage: cache read, acquisition/clipping, transcription,
//! frame sampling, vision description, and cache population.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use vox_models::CachedVideoAsset;
use vox_queue::GenerateVideoJob;
use vox_storage::{cache_clip_key, cache_frame_key};

use crate::deps::PipelineContext;
use crate::error::{WorkerError, WorkerResult};
use crate::workspace::JobWorkspace;

/// Substituted when the vision service errors out on sampled frames.
pub const VISION_FAILURE_PLACEHOLDER: &str = "Error occurred during frame analysis.";

/// Instruction sent with the batched frames.
const VISION_INSTRUCTION: &str = "Analyze these video frames. Provide a concise, \
comma-separated list of key actions, objects, or scenes depicted. Focus on elements \
relevant for generating commentary. Example: 'man smiles, dog jumps, logo appears'. \
Max 100 words total.";

/// Upload ceiling of the speech-to-text service.
const MAX_TRANSCRIBE_BYTES: u64 = 25 * 1024 * 1024;

/// Everything later stages need from the source video.
pub struct SourceAssets {
    /// Local playable clip, always present (composition needs a video track)
    pub clip_path: PathBuf,
    /// Sampled frames in chronological order (may be empty)
    pub frame_paths: Vec<PathBuf>,
    /// Transcript of the clip audio, when available
    pub transcript: Option<String>,
    /// Vision description of the sampled frames, when available
    pub frame_descriptions: Option<String>,
    /// True when transcript/description came from the cross-job cache
    pub served_from_cache: bool,
    /// Soft-failure notes accumulated while producing these assets
    pub degradations: Vec<String>,
}

/// Obtain the source assets for a job, via the cache when possible.
///
/// Performs at most one cache read, and (on a full miss that produced a
/// description) at most one cache write.
pub async fn obtain_source_assets(
    ctx: &PipelineContext,
    job: &GenerateVideoJob,
    ws: &JobWorkspace,
    identifier: Option<&str>,
) -> WorkerResult<SourceAssets> {
    let degradations = Vec::new();

    let cached = match identifier {
        Some(id) => match ctx.cache.get(id).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(
                    job_id = %job.job_id,
                    identifier = id,
                    error = %e,
                    "Asset cache lookup failed, processing from source"
                );
                None
            }
        },
        None => {
            debug!(job_id = %job.job_id, "Unrecognized video URL shape, job runs uncached");
            None
        }
    };

    let row_exists = cached.is_some();
    if let Some(asset) = cached.filter(CachedVideoAsset::has_text_assets) {
        return use_cached_assets(ctx, job, ws, asset, degradations).await;
    }

    process_from_source(ctx, job, ws, identifier, row_exists, degradations).await
}

/// Serve transcript and description from the cache, making sure a local
/// playable clip exists for composition.
async fn use_cached_assets(
    ctx: &PipelineContext,
    job: &GenerateVideoJob,
    ws: &JobWorkspace,
    asset: CachedVideoAsset,
    mut degradations: Vec<String>,
) -> WorkerResult<SourceAssets> {
    info!(
        job_id = %job.job_id,
        identifier = %asset.source_video_identifier,
        "Using cached transcript and frame descriptions"
    );

    if let Err(e) = ctx
        .cache
        .touch_last_accessed(&asset.source_video_identifier)
        .await
    {
        warn!(
            job_id = %job.job_id,
            identifier = %asset.source_video_identifier,
            error = %e,
            "Could not bump cache last_accessed_at"
        );
    }

    let clip_path = ws.file("source_clip.mp4");
    let mut clip_ready = false;

    if let Some(key) = &asset.clipped_video_key {
        match ctx.storage.download_file(key, &clip_path).await {
            Ok(()) => {
                info!(job_id = %job.job_id, key = %key, "Fetched cached source clip");
                clip_ready = true;
            }
            Err(e) => {
                warn!(
                    job_id = %job.job_id,
                    key = %key,
                    error = %e,
                    "Cached clip fetch failed, re-acquiring source"
                );
                degradations.push("cached clip unavailable, source re-acquired".to_string());
            }
        }
    }

    if !clip_ready {
        acquire_clip(ctx, job, &clip_path).await?;
    }

    let frame_paths = sample_frames_soft(ctx, job, &clip_path, ws, &mut degradations).await;

    Ok(SourceAssets {
        clip_path,
        frame_paths,
        transcript: asset.audio_transcript,
        frame_descriptions: asset.frame_descriptions,
        served_from_cache: true,
        degradations,
    })
}

/// Full processing path: acquire, transcribe, sample, describe, cache.
async fn process_from_source(
    ctx: &PipelineContext,
    job: &GenerateVideoJob,
    ws: &JobWorkspace,
    identifier: Option<&str>,
    row_exists: bool,
    mut degradations: Vec<String>,
) -> WorkerResult<SourceAssets> {
    let clip_path = ws.file("source_clip.mp4");
    acquire_clip(ctx, job, &clip_path).await?;

    let transcript = transcribe_clip(ctx, job, &clip_path, ws, &mut degradations).await;
    let frame_paths = sample_frames_soft(ctx, job, &clip_path, ws, &mut degradations).await;
    let frame_descriptions =
        describe_frames_soft(ctx, job, &frame_paths, &mut degradations).await;

    if let (Some(id), Some(descriptions)) = (identifier, frame_descriptions.as_deref()) {
        if row_exists {
            debug!(
                job_id = %job.job_id,
                identifier = id,
                "Cache row already exists, skipping population"
            );
        } else {
            populate_cache(
                ctx,
                job,
                id,
                &clip_path,
                &frame_paths,
                transcript.as_deref(),
                descriptions,
            )
            .await;
        }
    }

    Ok(SourceAssets {
        clip_path,
        frame_paths,
        transcript,
        frame_descriptions,
        served_from_cache: false,
        degradations,
    })
}

/// Fatal: the pipeline cannot proceed without a local clip.
async fn acquire_clip(
    ctx: &PipelineContext,
    job: &GenerateVideoJob,
    clip_path: &Path,
) -> WorkerResult<()> {
    info!(job_id = %job.job_id, url = %job.video_url, "Downloading and clipping source video");
    ctx.media
        .acquire_clip(
            &job.video_url,
            clip_path,
            ctx.config.clip_start_secs,
            ctx.config.clip_max_duration_secs,
        )
        .await
        .map_err(|e| WorkerError::acquisition_failed(e.to_string()))
}

/// Soft: a job without frames still produces commentary.
async fn sample_frames_soft(
    ctx: &PipelineContext,
    job: &GenerateVideoJob,
    clip_path: &Path,
    ws: &JobWorkspace,
    degradations: &mut Vec<String>,
) -> Vec<PathBuf> {
    match ctx
        .media
        .sample_frames(clip_path, &ws.frames_dir(), ctx.config.frame_interval_secs)
        .await
    {
        Ok(frames) => {
            info!(job_id = %job.job_id, count = frames.len(), "Sampled frames from clip");
            frames
        }
        Err(e) => {
            warn!(job_id = %job.job_id, error = %e, "Frame sampling failed, continuing without frames");
            degradations.push("frame sampling failed".to_string());
            Vec::new()
        }
    }
}

/// Soft: dialogue generation falls back to a summary when this fails.
async fn transcribe_clip(
    ctx: &PipelineContext,
    job: &GenerateVideoJob,
    clip_path: &Path,
    ws: &JobWorkspace,
    degradations: &mut Vec<String>,
) -> Option<String> {
    let audio_path = ws.file("transcribe_audio.mp3");

    let result: WorkerResult<String> = async {
        ctx.media
            .extract_compressed_audio(clip_path, &audio_path)
            .await?;

        let audio = tokio::fs::read(&audio_path).await?;
        if audio.len() as u64 > MAX_TRANSCRIBE_BYTES {
            warn!(
                job_id = %job.job_id,
                size_bytes = audio.len(),
                "Compressed audio exceeds the transcription ceiling, the request may be rejected"
            );
        }

        let text = ctx.stt.transcribe(audio, "transcribe_audio.mp3").await?;
        Ok(text)
    }
    .await;

    match result {
        Ok(text) => {
            let text = truncate_transcript(text, ctx.config.max_transcript_chars);
            info!(job_id = %job.job_id, chars = text.len(), "Clip audio transcribed");
            Some(text)
        }
        Err(e) => {
            warn!(
                job_id = %job.job_id,
                error = %e,
                "Transcription failed, proceeding without a transcript"
            );
            degradations.push("transcription unavailable".to_string());
            None
        }
    }
}

/// Soft: substitutes a placeholder description when the service errors.
async fn describe_frames_soft(
    ctx: &PipelineContext,
    job: &GenerateVideoJob,
    frame_paths: &[PathBuf],
    degradations: &mut Vec<String>,
) -> Option<String> {
    if frame_paths.is_empty() {
        return None;
    }

    let selected = &frame_paths[..frame_paths.len().min(ctx.config.max_vision_frames)];
    let mut frames = Vec::with_capacity(selected.len());
    for path in selected {
        match tokio::fs::read(path).await {
            Ok(bytes) => frames.push(bytes),
            Err(e) => warn!(
                job_id = %job.job_id,
                frame = %path.display(),
                error = %e,
                "Could not read sampled frame"
            ),
        }
    }
    if frames.is_empty() {
        return None;
    }

    match ctx.vision.describe_frames(&frames, VISION_INSTRUCTION).await {
        Ok(description) => Some(description),
        Err(e) => {
            warn!(
                job_id = %job.job_id,
                error = %e,
                "Vision description failed, substituting placeholder"
            );
            degradations.push("frame analysis failed".to_string());
            Some(VISION_FAILURE_PLACEHOLDER.to_string())
        }
    }
}

/// Best-effort cache population: clip and frames go to object storage, then
/// one atomic insert-if-absent writes the row. Nothing here can fail the job.
async fn populate_cache(
    ctx: &PipelineContext,
    job: &GenerateVideoJob,
    identifier: &str,
    clip_path: &Path,
    frame_paths: &[PathBuf],
    transcript: Option<&str>,
    descriptions: &str,
) {
    let mut asset = CachedVideoAsset::new(identifier);
    asset.audio_transcript = transcript.map(str::to_string);
    asset.frame_descriptions = Some(descriptions.to_string());

    let clip_key = cache_clip_key(identifier);
    match ctx.storage.upload_file(clip_path, &clip_key, "video/mp4").await {
        Ok(()) => asset.clipped_video_key = Some(clip_key),
        Err(e) => warn!(
            job_id = %job.job_id,
            identifier = identifier,
            error = %e,
            "Could not upload source clip to cache"
        ),
    }

    for path in frame_paths {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        let key = cache_frame_key(identifier, &name);
        match ctx.storage.upload_file(path, &key, "image/jpeg").await {
            Ok(()) => asset.frame_keys.push(key),
            Err(e) => warn!(
                job_id = %job.job_id,
                frame = %name,
                error = %e,
                "Could not upload frame to cache"
            ),
        }
    }

    match ctx.cache.insert_if_absent(&asset).await {
        Ok(true) => info!(job_id = %job.job_id, identifier = identifier, "Cached new video assets"),
        Ok(false) => debug!(
            job_id = %job.job_id,
            identifier = identifier,
            "Another job cached this video first"
        ),
        Err(e) => warn!(
            job_id = %job.job_id,
            identifier = identifier,
            error = %e,
            "Cache write failed"
        ),
    }
}

fn truncate_transcript(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    warn!(
        chars = text.chars().count(),
        max = max_chars,
        "Transcript is very long, truncating"
    );
    text.chars().take(max_chars).collect()
}
