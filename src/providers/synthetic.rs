//! Synthetic tone provider.
//!
//! Renders meditation tones locally and encodes them as 16-bit stereo WAV.
//! Used when no hosted credential is configured, and as the fallback.

use async_trait::async_trait;

use crate::audio::{encode_wav, render_tones, seed_from_prompt, ToneSpec, SAMPLE_RATE};
use crate::error::ProviderError;
use crate::types::{
    AudioFormat, AudioReference, GeneratedAudio, GenerationConfig, DEFAULT_TEMPO_BPM,
};

use super::{MusicProvider, ProviderKind};

/// Registry name of the synthetic provider.
pub const SYNTHETIC_PROVIDER: &str = "synthetic";

/// Longest rendering in seconds.
pub const MAX_DURATION_SEC: u32 = 300;

/// Local tone synthesizer. Always healthy.
#[derive(Debug, Clone)]
pub struct SyntheticToneProvider {
    name: String,
    sample_rate: u32,
    max_duration_sec: u32,
}

impl Default for SyntheticToneProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticToneProvider {
    /// Creates the provider with the standard 44.1kHz output.
    pub fn new() -> Self {
        Self {
            name: SYNTHETIC_PROVIDER.to_string(),
            sample_rate: SAMPLE_RATE,
            max_duration_sec: MAX_DURATION_SEC,
        }
    }

    /// Overrides the output sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Overrides the maximum duration.
    pub fn with_max_duration(mut self, max_duration_sec: u32) -> Self {
        self.max_duration_sec = max_duration_sec;
        self
    }

    /// Overrides the registry name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[async_trait]
impl MusicProvider for SyntheticToneProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Synthetic
    }

    fn max_duration_sec(&self) -> u32 {
        self.max_duration_sec
    }

    fn supports_vocals(&self) -> bool {
        false
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GeneratedAudio, ProviderError> {
        let duration_sec = config.clamped_duration(self.max_duration_sec);
        if duration_sec == 0 {
            return Err(ProviderError::invalid_request("duration must be > 0 seconds"));
        }

        if config.include_vocals {
            tracing::debug!(provider = %self.name, "vocals not supported, rendering instrumental");
        }

        let spec = ToneSpec {
            sample_rate: self.sample_rate,
            duration_sec,
            bpm: config
                .tempo
                .as_ref()
                .map(|t| t.bpm())
                .unwrap_or(DEFAULT_TEMPO_BPM),
            binaural_hz: config.binaural_hz(),
            seed: seed_from_prompt(prompt),
        };

        // Rendering minutes of audio is CPU bound; keep it off the async workers.
        let bytes = tokio::task::spawn_blocking(move || {
            let samples = render_tones(&spec);
            encode_wav(&samples, spec.sample_rate)
        })
        .await
        .map_err(|e| ProviderError::upstream_unavailable(format!("synthesis task failed: {}", e)))?
        .map_err(|e| ProviderError::upstream_unavailable(format!("synthesis failed: {}", e.message)))?;

        tracing::debug!(
            provider = %self.name,
            duration_sec,
            bytes = bytes.len(),
            "synthesized tones"
        );

        Ok(GeneratedAudio::new(
            AudioReference::Inline(bytes),
            duration_sec,
            AudioFormat::Wav,
            self.name.clone(),
            prompt,
            config,
        ))
    }
}
