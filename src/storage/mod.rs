//! Storage module for generated audio.
//!
//! Provides the disk-backed audio store served by the gateway.

pub mod audio;

// Re-export commonly used types
pub use audio::{AudioStore, StoredAudio};
