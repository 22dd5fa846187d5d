//! Music provider abstraction.
//!
//! Every generation backend implements [`MusicProvider`]. The coordinator
//! keeps providers in a registry keyed by [`MusicProvider::name`]; the set of
//! concrete variants is closed and described by [`ProviderKind`]:
//! - **Hosted** ([`ElevenLabsProvider`]): network call to a text-to-music API, MP3 output
//! - **Synthetic** ([`SyntheticToneProvider`]): local tone synthesis, WAV output

pub mod elevenlabs;
pub mod synthetic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::types::{GeneratedAudio, GenerationConfig};

pub use elevenlabs::{ElevenLabsProvider, ELEVENLABS_PROVIDER};
pub use synthetic::{SyntheticToneProvider, SYNTHETIC_PROVIDER};

/// Category of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Delegates to an external API with a credential.
    Hosted,
    /// Renders audio locally with no network dependency.
    Synthetic,
}

impl ProviderKind {
    /// Returns the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Hosted => "hosted",
            ProviderKind::Synthetic => "synthetic",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A backend that turns a finished prompt into audio.
///
/// Providers hold no per-request state. Implementations must:
/// - keep `health_check` within a short time budget and never fail hard;
/// - report failures as [`ProviderError`] instead of transport errors;
/// - clamp the returned duration to `min(config.duration_sec, max_duration_sec())`;
/// - never retry internally.
#[async_trait]
pub trait MusicProvider: Send + Sync {
    /// Unique registry name.
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    /// Longest audio the provider renders in one call, in seconds.
    fn max_duration_sec(&self) -> u32;

    fn supports_vocals(&self) -> bool;

    /// Returns true if the provider can currently accept work.
    async fn health_check(&self) -> bool;

    /// Generates audio for the prompt.
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GeneratedAudio, ProviderError>;
}
