//! OpenAI REST client for the VoxOver pipeline.
//!
//! This crate provides:
//! - Chat completions (dialogue generation)
//! - Batched frame description through the vision-capable chat endpoint
//! - Whisper transcription (multipart upload)
//! - TTS synthesis at a per-job speaking pace
//!
//! The four concerns are exposed as narrow traits so the orchestrator can
//! be exercised against fakes; `OpenAiClient` implements all of them.

pub mod client;
pub mod error;
pub mod traits;

pub use client::{ChatContent, ChatMessage, ContentPart, ImageUrl, OpenAiClient, OpenAiConfig};
pub use error::{AiError, AiResult};
pub use traits::{ChatCompletion, DescribeFrames, SpeechToText, TextToSpeech};
