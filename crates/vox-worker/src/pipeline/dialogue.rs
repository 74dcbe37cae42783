//! Dialogue generation: prompt assembly, completion call, parsing.

use tracing::info;

use vox_ai::ChatMessage;
use vox_models::{parse_dialogue_response, DialogueScript, Persona};
use vox_queue::GenerateVideoJob;

use crate::deps::PipelineContext;
use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::assets::SourceAssets;

/// Output-token budget for the dialogue completion.
const DIALOGUE_MAX_TOKENS: u32 = 280;

/// Sampling temperature for the dialogue completion.
const DIALOGUE_TEMPERATURE: f32 = 0.7;

/// Used when neither a transcript nor a caller-supplied summary exists.
pub const FALLBACK_SUMMARY: &str = "Unable to generate transcript summary.";

/// Used when no visual description is available.
const NO_VISUALS_PLACEHOLDER: &str = "No visual description available.";

/// Build the two-message dialogue prompt.
pub fn build_dialogue_prompt(
    personas: &[Persona],
    transcript_summary: &str,
    frame_descriptions: Option<&str>,
    user_guidance: Option<&str>,
) -> Vec<ChatMessage> {
    let mut roster = String::new();
    for (i, persona) in personas.iter().enumerate() {
        roster.push_str(&format!(
            "{}. {}\n   Style: {}\n",
            i + 1,
            persona.name,
            persona.style.as_deref().unwrap_or("No specific style defined")
        ));
        if let Some(constraints) = persona.constraints.as_deref() {
            roster.push_str(&format!("   Constraints: {}\n", constraints));
        }
        if let Some(backstory) = persona.backstory.as_deref() {
            roster.push_str(&format!("   Backstory: {}\n", backstory));
        }
    }

    let system = format!(
        "You are the writer for a video commentary system that generates entertaining, \
witty dialogue between characters who are watching and reacting to a video.

SPEAKERS:
{roster}
The dialogue should follow these rules:
1. Keep each line concise and natural-sounding (15-20 words maximum per line)
2. Maintain the distinct personality and style of each speaker throughout
3. Have the speakers react to and comment on the content they are watching
4. Follow any constraints listed for a speaker
5. Don't narrate actions, just create dialogue as if the characters are watching the video in real-time

Output format must be:
CHARACTER_NAME: Dialogue text"
    );

    let guidance_section = match user_guidance {
        Some(guidance) => format!("\nADDITIONAL GUIDANCE: {}\n", guidance),
        None => String::new(),
    };

    let user = format!(
        "Here's the video content to react to:

TRANSCRIPT:
{transcript}

VISUAL ELEMENTS:
{visuals}
{guidance}
Create a dialogue script with the characters reacting to this content. \
Make it entertaining and funny - the speakers should have strong opinions and unique perspectives.",
        transcript = transcript_summary,
        visuals = frame_descriptions.unwrap_or(NO_VISUALS_PLACEHOLDER),
        guidance = guidance_section,
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Generate and parse the dialogue script for a job.
///
/// A completion transport failure or empty reply is fatal; an empty *parse*
/// is not - the caller completes the job with a script of zero lines.
pub async fn generate_dialogue(
    ctx: &PipelineContext,
    job: &GenerateVideoJob,
    source: &SourceAssets,
) -> WorkerResult<DialogueScript> {
    let summary = source
        .transcript
        .as_deref()
        .or(job.transcript_summary.as_deref())
        .unwrap_or(FALLBACK_SUMMARY);

    let messages = build_dialogue_prompt(
        &job.personas,
        summary,
        source.frame_descriptions.as_deref(),
        job.user_guidance.as_deref(),
    );

    let reply = ctx
        .chat
        .complete(&messages, DIALOGUE_MAX_TOKENS, DIALOGUE_TEMPERATURE)
        .await
        .map_err(|e| WorkerError::dialogue_failed(e.to_string()))?;

    let script = parse_dialogue_response(&reply);
    info!(
        job_id = %job.job_id,
        lines = script.lines.len(),
        from_cache = source.served_from_cache,
        "Parsed dialogue script"
    );
    if let Some(remark) = &script.closing_remark {
        info!(job_id = %job.job_id, "Script ended with a closing remark: {}", remark);
    }

    Ok(script)
}
