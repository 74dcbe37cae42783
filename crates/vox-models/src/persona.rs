//! Personas and TTS voice assignment.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A commentary persona, immutable once captured into a job payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Display name, also used as the speaker label in generated scripts
    pub name: String,

    /// Speaking style description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// Hard constraints the dialogue writer must follow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,

    /// Optional contextual background
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backstory: Option<String>,

    /// Preferred TTS voice, carried as persona data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_preference: Option<TtsVoice>,

    /// Free-form tags for organizing persona libraries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Persona {
    /// Create a persona with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            style: None,
            constraints: None,
            backstory: None,
            voice_preference: None,
            tags: None,
        }
    }

    /// Set the speaking style.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// Available TTS voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsVoice {
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl TtsVoice {
    /// Get the wire name of the voice.
    pub fn as_str(&self) -> &'static str {
        match self {
            TtsVoice::Alloy => "alloy",
            TtsVoice::Echo => "echo",
            TtsVoice::Fable => "fable",
            TtsVoice::Onyx => "onyx",
            TtsVoice::Nova => "nova",
            TtsVoice::Shimmer => "shimmer",
        }
    }
}

impl fmt::Display for TtsVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed assignment palette, in assignment order.
pub const VOICE_PALETTE: [TtsVoice; 6] = [
    TtsVoice::Alloy,
    TtsVoice::Fable,
    TtsVoice::Onyx,
    TtsVoice::Nova,
    TtsVoice::Shimmer,
    TtsVoice::Echo,
];

/// Assigns each distinct speaker a voice from the palette in first-seen
/// order. Speaker N gets `VOICE_PALETTE[N % VOICE_PALETTE.len()]`; the
/// mapping is stable for the assigner's lifetime.
#[derive(Debug, Default)]
pub struct VoiceAssigner {
    assignments: HashMap<String, TtsVoice>,
    next_index: usize,
}

impl VoiceAssigner {
    /// Create an empty assigner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the voice for a speaker, assigning one on first sight.
    pub fn voice_for(&mut self, speaker: &str) -> TtsVoice {
        if let Some(voice) = self.assignments.get(speaker) {
            return *voice;
        }
        let voice = VOICE_PALETTE[self.next_index % VOICE_PALETTE.len()];
        self.assignments.insert(speaker.to_string(), voice);
        self.next_index += 1;
        voice
    }

    /// Number of distinct speakers seen so far.
    pub fn speaker_count(&self) -> usize {
        self.assignments.len()
    }
}
