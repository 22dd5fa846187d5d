//! GenerationConfig type describing the requested soundscape.
//!
//! A GenerationConfig is built once per request and passed by reference to
//! the prompt builder and to providers; nothing mutates it afterwards.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Duration used when a request does not specify one.
pub const DEFAULT_DURATION_SEC: u32 = 30;

/// BPM used for tempo descriptors that are not in the lookup table.
pub const DEFAULT_TEMPO_BPM: u32 = 80;

/// Requested tempo, either an explicit BPM or a descriptive word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tempo {
    /// Explicit beats per minute.
    Bpm(u32),
    /// Descriptor such as "slow", "medium" or "fast".
    Descriptor(String),
}

impl Tempo {
    /// Resolves the tempo to a BPM value.
    ///
    /// Descriptors map to the midpoint of their range:
    /// slow → 70, medium → 90, fast → 110. Anything else yields 80.
    pub fn bpm(&self) -> u32 {
        match self {
            Tempo::Bpm(bpm) => *bpm,
            Tempo::Descriptor(name) => match name.trim().to_lowercase().as_str() {
                "slow" => 70,
                "medium" => 90,
                "fast" => 110,
                _ => DEFAULT_TEMPO_BPM,
            },
        }
    }

    /// Parses a CLI/env value: digits become [`Tempo::Bpm`], anything else a descriptor.
    pub fn parse(s: &str) -> Self {
        match s.trim().parse::<u32>() {
            Ok(bpm) => Tempo::Bpm(bpm),
            Err(_) => Tempo::Descriptor(s.trim().to_string()),
        }
    }
}

impl From<u32> for Tempo {
    fn from(bpm: u32) -> Self {
        Tempo::Bpm(bpm)
    }
}

impl From<&str> for Tempo {
    fn from(name: &str) -> Self {
        Tempo::Descriptor(name.to_string())
    }
}

/// Structured description of the music to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Requested duration in seconds.
    pub duration_sec: u32,

    /// Free-text style tag (e.g. "ambient").
    pub style: Option<String>,

    /// Free-text mood tag (e.g. "peaceful").
    pub mood: Option<String>,

    /// Requested tempo.
    pub tempo: Option<Tempo>,

    /// Musical key (e.g. "C minor").
    pub key: Option<String>,

    /// Instruments to feature. Order carries no meaning; the set keeps
    /// iteration deterministic.
    pub instruments: BTreeSet<String>,

    /// Whether vocals are wanted.
    pub include_vocals: bool,

    /// Whether to mix in a binaural beat.
    pub binaural: bool,

    /// Binaural beat frequency in Hz. Only used when `binaural` is set.
    pub binaural_frequency: Option<f32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            duration_sec: DEFAULT_DURATION_SEC,
            style: None,
            mood: None,
            tempo: None,
            key: None,
            instruments: BTreeSet::new(),
            include_vocals: false,
            binaural: false,
            binaural_frequency: None,
        }
    }
}

impl GenerationConfig {
    /// Creates a config with the given duration and no other preferences.
    pub fn new(duration_sec: u32) -> Self {
        Self {
            duration_sec,
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn with_tempo(mut self, tempo: impl Into<Tempo>) -> Self {
        self.tempo = Some(tempo.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_instrument(mut self, instrument: impl Into<String>) -> Self {
        self.instruments.insert(instrument.into());
        self
    }

    pub fn with_vocals(mut self, include_vocals: bool) -> Self {
        self.include_vocals = include_vocals;
        self
    }

    /// Enables a binaural beat at the given frequency.
    pub fn with_binaural(mut self, frequency_hz: f32) -> Self {
        self.binaural = true;
        self.binaural_frequency = Some(frequency_hz);
        self
    }

    /// Returns the binaural frequency if binaural mixing is requested and a
    /// frequency was given.
    pub fn binaural_hz(&self) -> Option<f32> {
        if self.binaural {
            self.binaural_frequency
        } else {
            None
        }
    }

    /// Returns the duration a provider with the given limit will render.
    pub fn clamped_duration(&self, max_duration_sec: u32) -> u32 {
        self.duration_sec.min(max_duration_sec)
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if self.duration_sec == 0 {
            return Some("duration must be > 0 seconds".to_string());
        }

        if let Some(freq) = self.binaural_frequency {
            if !freq.is_finite() || freq <= 0.0 {
                return Some(format!(
                    "binaural frequency must be a positive number, got {}",
                    freq
                ));
            }
        }

        None
    }
}
