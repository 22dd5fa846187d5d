//! Audio output module.
//!
//! Provides WAV encoding and the synthetic tone renderer.

pub mod tone;
pub mod wav;

// Re-export commonly used items
pub use tone::{render_tones, seed_from_prompt, ToneSpec};
pub use wav::{
    encode_wav, inspect_wav, samples_to_duration, WavInfo, BITS_PER_SAMPLE, CHANNELS, SAMPLE_RATE,
};
