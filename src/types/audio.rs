//! GeneratedAudio type representing one produced artifact.
//!
//! A GeneratedAudio is created once per successful provider call and is
//! never updated afterwards. Exactly one provider is responsible for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::generation::GenerationConfig;

/// Container/codec of a generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// 16-bit PCM RIFF/WAVE.
    Wav,
    /// MPEG-1 Layer III.
    Mp3,
}

impl AudioFormat {
    /// Returns the string representation of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }

    /// Returns the file extension used for stored files.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Returns the MIME type served for this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }

    /// Parses a format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "wav" | "wave" => Some(AudioFormat::Wav),
            "mp3" => Some(AudioFormat::Mp3),
            _ => None,
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the audio of a GeneratedAudio lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioReference {
    /// Encoded container bytes held in memory.
    Inline(Vec<u8>),
    /// A dereferenceable URI.
    Uri(String),
}

/// Provenance of a generated artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadata {
    /// Name of the provider that produced the audio.
    pub provider: String,

    /// Final prompt text sent to the provider.
    pub prompt: String,

    /// Configuration the audio was generated with.
    pub config: GenerationConfig,

    /// Duration the caller asked for, before any provider clamp.
    pub requested_duration_sec: u32,

    /// When the artifact was created.
    pub created_at: DateTime<Utc>,
}

/// A successfully generated audio artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAudio {
    /// The audio itself.
    pub audio: AudioReference,

    /// Actual duration in seconds. Never exceeds the producing provider's maximum.
    pub duration_sec: u32,

    /// Container format of `audio`.
    pub format: AudioFormat,

    /// Provenance.
    pub metadata: AudioMetadata,
}

impl GeneratedAudio {
    /// Creates a new artifact stamped with the current time.
    pub fn new(
        audio: AudioReference,
        duration_sec: u32,
        format: AudioFormat,
        provider: impl Into<String>,
        prompt: impl Into<String>,
        config: &GenerationConfig,
    ) -> Self {
        Self {
            audio,
            duration_sec,
            format,
            metadata: AudioMetadata {
                provider: provider.into(),
                prompt: prompt.into(),
                config: config.clone(),
                requested_duration_sec: config.duration_sec,
                created_at: Utc::now(),
            },
        }
    }

    /// Returns the in-memory container bytes, if the audio is held inline.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.audio {
            AudioReference::Inline(bytes) => Some(bytes),
            AudioReference::Uri(_) => None,
        }
    }

    /// Returns true if the provider shortened the requested duration.
    pub fn was_clamped(&self) -> bool {
        self.duration_sec < self.metadata.requested_duration_sec
    }
}
