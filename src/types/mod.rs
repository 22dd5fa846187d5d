//! Core types for the meditation music service.
//!
//! This module re-exports all the core data types:
//! - [`GenerationConfig`]: Structured description of the requested music
//! - [`GeneratedAudio`]: A produced audio artifact with provenance
//! - [`Tempo`]: Explicit BPM or descriptive tempo

mod audio;
mod generation;

// Re-export all types at the module level
pub use audio::{AudioFormat, AudioMetadata, AudioReference, GeneratedAudio};
pub use generation::{GenerationConfig, Tempo, DEFAULT_DURATION_SEC, DEFAULT_TEMPO_BPM};
