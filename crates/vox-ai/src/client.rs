//! OpenAI API client.

use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use vox_models::TtsVoice;

use crate::error::{AiError, AiResult};
use crate::traits::{ChatCompletion, DescribeFrames, SpeechToText, TextToSpeech};

/// OpenAI client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key
    pub api_key: String,
    /// API base URL (override for testing/proxies)
    pub base_url: String,
    /// Chat/vision model
    pub chat_model: String,
    /// Speech-to-text model
    pub stt_model: String,
    /// Text-to-speech model
    pub tts_model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> AiResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AiError::config_error("OPENAI_API_KEY not set"))?;

        Ok(Self {
            api_key,
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            chat_model: std::env::var("OPENAI_CHAT_MODEL")
                .unwrap_or_else(|_| "gpt-4o".to_string()),
            stt_model: std::env::var("OPENAI_STT_MODEL")
                .unwrap_or_else(|_| "whisper-1".to_string()),
            tts_model: std::env::var("OPENAI_TTS_MODEL")
                .unwrap_or_else(|_| "tts-1-hd".to_string()),
            timeout: Duration::from_secs(120),
        })
    }
}

/// A chat message in a completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: ChatContent,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: ChatContent::Text(content.into()),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: ChatContent::Text(content.into()),
        }
    }

    /// Create a user message with mixed text/image parts.
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user".to_string(),
            content: ChatContent::Parts(parts),
        }
    }
}

/// Either plain text or a multi-part (vision) message body.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One part of a multi-part message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

/// An image reference, inlined as a data URL.
#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
    speed: f32,
}

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Create a new client.
    pub fn new(config: OpenAiConfig) -> AiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("vox-ai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AiError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> AiResult<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn check_status(response: reqwest::Response) -> AiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AiError::request_failed(format!(
            "API returned {}: {}",
            status, body
        )))
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> AiResult<String> {
        let request = ChatRequest {
            model: &self.config.chat_model,
            messages,
            max_tokens,
            temperature,
        };

        debug!(
            model = %self.config.chat_model,
            max_tokens = max_tokens,
            "Requesting chat completion"
        );

        let response = self
            .http
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AiError::EmptyCompletion)
    }
}

#[async_trait]
impl DescribeFrames for OpenAiClient {
    async fn describe_frames(&self, frames: &[Vec<u8>], instruction: &str) -> AiResult<String> {
        if frames.is_empty() {
            return Err(AiError::invalid_response("no frames to describe"));
        }

        let mut parts = vec![ContentPart::Text {
            text: instruction.to_string(),
        }];
        for frame in frames {
            let encoded = base64::engine::general_purpose::STANDARD.encode(frame);
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:image/jpeg;base64,{}", encoded),
                },
            });
        }

        let messages = [ChatMessage::user_parts(parts)];
        let description = self.complete(&messages, 150, 1.0).await?;

        info!(
            frames = frames.len(),
            "Vision description completed: {}",
            description.chars().take(80).collect::<String>()
        );
        Ok(description)
    }
}

#[async_trait]
impl SpeechToText for OpenAiClient {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> AiResult<String> {
        let part = multipart::Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str("audio/mpeg")
            .map_err(|e| AiError::invalid_response(format!("bad audio part: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", self.config.stt_model.clone())
            .part("file", part);

        let response = self
            .http
            .post(self.endpoint("audio/transcriptions"))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let parsed: TranscriptionResponse = response.json().await?;
        Ok(parsed.text)
    }
}

#[async_trait]
impl TextToSpeech for OpenAiClient {
    async fn synthesize(&self, voice: TtsVoice, text: &str, speed: f32) -> AiResult<Vec<u8>> {
        let request = SpeechRequest {
            model: &self.config.tts_model,
            voice: voice.as_str(),
            input: text,
            response_format: "wav",
            speed,
        };

        let response = self
            .http
            .post(self.endpoint("audio/speech"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(AiError::invalid_response("TTS returned empty audio"));
        }
        Ok(bytes)
    }
}
