//! Service traits implemented by the OpenAI client.
//!
//! The orchestrator depends on these rather than on the concrete client,
//! which keeps stage sequencing testable with counting fakes.

use async_trait::async_trait;

use vox_models::TtsVoice;

use crate::client::ChatMessage;
use crate::error::AiResult;

/// Chat-style text completion.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Request a completion and return the reply text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> AiResult<String>;
}

/// Batched visual description of sampled frames.
#[async_trait]
pub trait DescribeFrames: Send + Sync {
    /// Describe a batch of JPEG frames in one request.
    async fn describe_frames(&self, frames: &[Vec<u8>], instruction: &str) -> AiResult<String>;
}

/// Speech-to-text transcription.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio buffer; `file_name` hints the container format.
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> AiResult<String>;
}

/// Text-to-speech synthesis.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize one utterance and return the audio bytes (WAV).
    async fn synthesize(&self, voice: TtsVoice, text: &str, speed: f32) -> AiResult<Vec<u8>>;
}
