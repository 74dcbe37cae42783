//! Voice synthesis: per-speaker voice assignment and bounded-concurrency
//! per-line fan-out, rejoined in original line order.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use vox_models::{DialogueScript, VoiceAssigner};
use vox_queue::GenerateVideoJob;

use crate::deps::PipelineContext;

/// Result of synthesizing a script.
pub struct SynthesisOutcome {
    /// Per-line audio buffers in original line order (failed lines omitted)
    pub buffers: Vec<Vec<u8>>,
    /// Number of lines attempted
    pub attempted: usize,
    /// Number of lines whose synthesis failed
    pub failed: usize,
}

impl SynthesisOutcome {
    /// True when every attempted line failed.
    pub fn produced_nothing(&self) -> bool {
        self.attempted > 0 && self.buffers.is_empty()
    }
}

/// Synthesize audio for every line of the script.
///
/// Voices are assigned to speakers in first-seen order before the fan-out,
/// so the mapping is deterministic regardless of completion timing. Requests
/// run with bounded concurrency and results are rejoined in line order.
/// A failed line never discards the script or the other lines' audio.
pub async fn synthesize_lines(
    ctx: &PipelineContext,
    job: &GenerateVideoJob,
    script: &DialogueScript,
) -> SynthesisOutcome {
    let mut assigner = VoiceAssigner::new();
    let voiced: Vec<_> = script
        .lines
        .iter()
        .enumerate()
        .map(|(index, line)| (index, assigner.voice_for(&line.speaker), line.clone()))
        .collect();

    let attempted = voiced.len();
    let parallelism = ctx.config.max_tts_parallel.max(1);

    let results: Vec<Option<Vec<u8>>> = stream::iter(voiced)
        .map(|(index, voice, line)| {
            let tts = Arc::clone(&ctx.tts);
            let job_id = job.job_id.clone();
            let pace = job.speaking_pace;
            async move {
                debug!(
                    job_id = %job_id,
                    line_index = index,
                    speaker = %line.speaker,
                    voice = %voice,
                    pace = pace,
                    "Synthesizing line"
                );
                match tts.synthesize(voice, &line.text, pace).await {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        warn!(
                            job_id = %job_id,
                            line_index = index,
                            speaker = %line.speaker,
                            error = %e,
                            "TTS failed for line, keeping remaining lines"
                        );
                        None
                    }
                }
            }
        })
        .buffered(parallelism)
        .collect()
        .await;

    let buffers: Vec<Vec<u8>> = results.into_iter().flatten().collect();
    let failed = attempted - buffers.len();

    SynthesisOutcome {
        buffers,
        attempted,
        failed,
    }
}
