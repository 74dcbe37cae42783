//! Job pipeline orchestrator.
//!
//! Sequences the stages for one job: cache lookup, media acquisition,
//! transcription, vision description, dialogue generation, voice synthesis,
//! audio merge, video composition, and publication. Owns the job status
//! state machine (`queued -> processing -> completed | failed`) and the
//! per-job workspace, which is released on every exit path.
//!
//! Fatal stages (acquisition/clipping, the dialogue completion call,
//! composition, final-video upload) short-circuit to `failed`. Soft stages
//! (transcription, vision, per-line TTS, audio merge, voiceover/thumbnail
//! upload, cache writes) degrade the outcome and continue - the pipeline
//! always delivers the best artifact it still can.

pub mod assets;
pub mod dialogue;
pub mod publish;
pub mod synthesis;

use tracing::warn;

use vox_models::{resolve_video_identity, JobResultRefs};
use vox_queue::GenerateVideoJob;

use crate::deps::PipelineContext;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::workspace::JobWorkspace;

/// Process one job end to end, persisting the terminal status.
///
/// Returns `Err` only for unrecovered fatal-stage errors (after the job has
/// been marked failed), so the executor can drive retry/DLQ handling.
pub async fn process_job(ctx: &PipelineContext, job: &GenerateVideoJob) -> WorkerResult<()> {
    let logger = JobLogger::new(&job.job_id, "generate_video");
    logger.log_start(&format!(
        "video: {}, personas: {}, pace: {}",
        job.video_url,
        job.personas.len(),
        job.speaking_pace
    ));

    if let Err(e) = ctx.jobs.mark_processing(&job.job_id).await {
        logger.log_warning(&format!("could not mark job as processing: {}", e));
    }

    let workspace = match JobWorkspace::create(&ctx.config.work_dir, &job.job_id).await {
        Ok(ws) => ws,
        Err(e) => {
            logger.log_error(&format!("could not create job workspace: {}", e));
            if let Err(db_err) = ctx.jobs.fail(&job.job_id, &e.to_string()).await {
                logger.log_error(&format!("could not mark job as failed: {}", db_err));
            }
            return Err(e);
        }
    };

    let outcome = run_stages(ctx, job, &workspace).await;

    // Local artifacts are released on every exit path
    workspace.cleanup().await;

    match outcome {
        Ok(result) => {
            ctx.jobs.complete(&job.job_id, &result).await?;
            logger.log_completion(&result.status_message);
            Ok(())
        }
        Err(e) => {
            logger.log_error(&e.to_string());
            if let Err(db_err) = ctx.jobs.fail(&job.job_id, &e.to_string()).await {
                logger.log_error(&format!("could not mark job as failed: {}", db_err));
            }
            Err(e)
        }
    }
}

/// Run the pipeline stages, producing the result references to publish.
async fn run_stages(
    ctx: &PipelineContext,
    job: &GenerateVideoJob,
    ws: &JobWorkspace,
) -> WorkerResult<JobResultRefs> {
    let identifier = resolve_video_identity(&job.video_url);
    let source = assets::obtain_source_assets(ctx, job, ws, identifier.as_deref()).await?;
    let mut notes = source.degradations.clone();

    let script = dialogue::generate_dialogue(ctx, job, &source).await?;

    if script.is_empty() {
        return Ok(JobResultRefs {
            dialogue_text: script.raw_text.clone(),
            line_count: 0,
            status_message: status_message("Generated script has no speakable lines.", &notes),
            ..Default::default()
        });
    }

    let synthesis = synthesis::synthesize_lines(ctx, job, &script).await;
    if synthesis.failed > 0 {
        notes.push(format!(
            "{} of {} lines failed synthesis",
            synthesis.failed, synthesis.attempted
        ));
    }

    if synthesis.produced_nothing() {
        return Ok(JobResultRefs {
            dialogue_text: script.raw_text.clone(),
            line_count: script.lines.len(),
            status_message: status_message(
                &format!(
                    "Generated dialogue script with {} lines, but no audio was produced.",
                    script.lines.len()
                ),
                &notes,
            ),
            ..Default::default()
        });
    }

    let voiceover_path = ws.file("merged_voiceover.wav");
    if let Err(e) = ctx
        .media
        .merge_wav_buffers(&synthesis.buffers, &ws.audio_parts_dir(), &voiceover_path)
        .await
    {
        warn!(
            job_id = %job.job_id,
            error = %e,
            "Audio merge failed, delivering the script only"
        );
        notes.push(format!("audio merge failed: {}", e));
        return Ok(JobResultRefs {
            dialogue_text: script.raw_text.clone(),
            line_count: script.lines.len(),
            status_message: status_message(
                &format!("Generated dialogue script with {} lines.", script.lines.len()),
                &notes,
            ),
            ..Default::default()
        });
    }

    let audio_url = publish::upload_audio(ctx, &job.job_id, &voiceover_path).await;
    if audio_url.is_none() {
        notes.push("voiceover upload failed".to_string());
    }

    // The merged audio duration is the authoritative output length
    let target_duration = ctx
        .media
        .probe_duration(&voiceover_path)
        .await
        .map_err(|e| {
            WorkerError::composition_failed(format!(
                "could not determine voiceover duration: {}",
                e
            ))
        })?;

    let final_path = ws.file("final_video.mp4");
    ctx.media
        .compose(&source.clip_path, &voiceover_path, &final_path, target_duration)
        .await
        .map_err(|e| WorkerError::composition_failed(e.to_string()))?;

    let video_url = publish::upload_video(ctx, &job.job_id, &final_path).await?;

    let thumbnail_url = match source.frame_paths.first() {
        Some(first_frame) => publish::upload_thumbnail(ctx, &job.job_id, first_frame).await,
        None => None,
    };

    Ok(JobResultRefs {
        video_url: Some(video_url),
        audio_url,
        thumbnail_url,
        dialogue_text: script.raw_text.clone(),
        line_count: script.lines.len(),
        status_message: status_message(
            &format!(
                "Generated commentary video with {} lines.",
                script.lines.len()
            ),
            &notes,
        ),
    })
}

fn status_message(base: &str, notes: &[String]) -> String {
    if notes.is_empty() {
        base.to_string()
    } else {
        format!("{} ({})", base, notes.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_folds_notes() {
        assert_eq!(status_message("Done.", &[]), "Done.");
        assert_eq!(
            status_message(
                "Done.",
                &["transcription unavailable".to_string(), "x".to_string()]
            ),
            "Done. (transcription unavailable; x)"
        );
    }
}
