//! CLI argument parser.
//!
//! Provides one-shot generation from the command line, the gateway server
//! mode, and gateway key issuance.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::ServiceConfig;
use crate::types::{AudioFormat, GenerationConfig, Tempo, DEFAULT_DURATION_SEC};

/// File stem used when no output path is given.
pub const DEFAULT_OUTPUT_STEM: &str = "meditation";

/// meditation-music: meditation music generation with provider fallback
#[derive(Parser, Debug)]
#[command(name = "meditation-music")]
#[command(about = "Meditation music generator with hosted and synthetic providers")]
#[command(version)]
pub struct Cli {
    /// Text describing the music to generate
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Duration in seconds (providers clamp to their maximum)
    #[arg(short, long, default_value_t = DEFAULT_DURATION_SEC, value_parser = clap::value_parser!(u32).range(1..=300))]
    pub duration: u32,

    /// Style tag, e.g. ambient
    #[arg(long)]
    pub style: Option<String>,

    /// Mood tag, e.g. peaceful
    #[arg(long)]
    pub mood: Option<String>,

    /// Tempo as BPM or slow|medium|fast
    #[arg(short, long)]
    pub tempo: Option<String>,

    /// Musical key, e.g. "C minor"
    #[arg(short, long)]
    pub key: Option<String>,

    /// Instrument to feature (repeatable)
    #[arg(short, long = "instrument")]
    pub instruments: Vec<String>,

    /// Mix in a binaural beat
    #[arg(long)]
    pub binaural: bool,

    /// Binaural beat frequency in Hz
    #[arg(long, requires = "binaural")]
    pub frequency: Option<f32>,

    /// Allow vocals when the provider supports them
    #[arg(long)]
    pub vocals: bool,

    /// Provider to try first (e.g. elevenlabs, synthetic)
    #[arg(long)]
    pub provider: Option<String>,

    /// Output file path; the extension follows the produced format
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Run the HTTP gateway
    #[arg(long)]
    pub serve: bool,

    /// Gateway bind address
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Print a new gateway API key and exit
    #[arg(long)]
    pub issue_key: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Returns true if a one-shot generation was requested.
    pub fn is_cli_mode(&self) -> bool {
        !self.serve && !self.issue_key && self.prompt.is_some()
    }

    pub fn is_serve_mode(&self) -> bool {
        self.serve
    }

    pub fn is_issue_key_mode(&self) -> bool {
        self.issue_key
    }

    /// Builds the generation config from the flags.
    pub fn generation_config(&self) -> GenerationConfig {
        let mut config = GenerationConfig::new(self.duration);
        if let Some(ref style) = self.style {
            config = config.with_style(style.as_str());
        }
        if let Some(ref mood) = self.mood {
            config = config.with_mood(mood.as_str());
        }
        if let Some(ref tempo) = self.tempo {
            config = config.with_tempo(Tempo::parse(tempo));
        }
        if let Some(ref key) = self.key {
            config = config.with_key(key.as_str());
        }
        for instrument in &self.instruments {
            config = config.with_instrument(instrument.as_str());
        }
        config = config.with_vocals(self.vocals);
        config.binaural = self.binaural;
        config.binaural_frequency = self.frequency;
        config
    }

    /// Returns the output path with the extension of the produced format.
    pub fn output_path(&self, format: AudioFormat) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_STEM))
            .with_extension(format.extension())
    }

    /// Applies flag overrides on top of the environment configuration.
    pub fn apply_to(&self, config: &mut ServiceConfig) {
        if let Some(ref provider) = self.provider {
            config.preferred_provider = provider.trim().to_lowercase();
        }
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
    }
}
