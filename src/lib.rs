//! meditation-music: meditation music generation with provider fallback.
//!
//! This library turns a short description plus optional musical parameters
//! into an audio artifact. A [`generation::Coordinator`] builds the prompt,
//! then tries the preferred provider and a fixed fallback in order, each
//! gated by a health check.
//!
//! # Modules
//!
//! - [`types`]: Core data types (GenerationConfig, Tempo, GeneratedAudio)
//! - [`prompt`]: Deterministic prompt builder
//! - [`providers`]: The provider trait with hosted and synthetic variants
//! - [`generation`]: The coordinator and its provider registry
//! - [`audio`]: Tone synthesis and WAV encoding
//! - [`storage`]: Disk-backed store for generated files
//! - [`gateway`]: HTTP gateway (axum)
//! - [`config`]: Runtime configuration (ServiceConfig)
//! - [`error`]: Error types and codes (MusicError, ProviderError, GenerationError)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use meditation_music::{
//!     generation::Coordinator,
//!     providers::{SyntheticToneProvider, SYNTHETIC_PROVIDER},
//!     types::GenerationConfig,
//! };
//!
//! let coordinator = Coordinator::new(SYNTHETIC_PROVIDER);
//! coordinator.add_provider(Arc::new(SyntheticToneProvider::new()));
//!
//! let config = GenerationConfig::new(60).with_tempo("slow").with_key("C minor");
//! let audio = coordinator
//!     .generate("Create calming music for deep sleep", &config)
//!     .await?;
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod generation;
pub mod prompt;
pub mod providers;
pub mod storage;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use config::ServiceConfig;
pub use error::{ErrorCode, GenerationError, MusicError, ProviderError, ProviderErrorKind, Result};
pub use generation::{Coordinator, SegmentPolicy};
pub use prompt::build_prompt;
pub use providers::{MusicProvider, ProviderKind};
pub use types::{AudioFormat, GeneratedAudio, GenerationConfig, Tempo};
