//! WAV container writer and inspector.
//!
//! Encodes interleaved samples as 16-bit PCM RIFF/WAVE using the hound crate,
//! and reads headers back for verification.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{MusicError, Result};

/// Audio sample rate for synthesized output (44.1kHz).
pub const SAMPLE_RATE: u32 = 44_100;

/// Number of audio channels (stereo).
pub const CHANNELS: u16 = 2;

/// Bit depth of encoded PCM samples.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Header fields of an encoded WAV container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Number of sample frames (samples per channel).
    pub frames: u32,
}

impl WavInfo {
    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f32 {
        samples_to_duration(self.frames as usize, self.sample_rate)
    }
}

/// Encodes interleaved stereo samples into an in-memory WAV container.
///
/// Samples are clamped to [-1.0, 1.0] and quantized to 16-bit PCM.
/// `samples.len()` must be a multiple of [`CHANNELS`].
///
/// # Example
///
/// ```ignore
/// use meditation_music::audio::encode_wav;
///
/// let samples = vec![0.0, 0.0, 0.5, -0.5];
/// let bytes = encode_wav(&samples, 44_100)?;
/// assert_eq!(&bytes[0..4], b"RIFF");
/// ```
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    if samples.len() % CHANNELS as usize != 0 {
        return Err(MusicError::encoding_failed(format!(
            "{} samples is not a whole number of {}-channel frames",
            samples.len(),
            CHANNELS
        )));
    }

    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));

    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(|e| {
            MusicError::encoding_failed(format!("Failed to create WAV writer: {}", e))
        })?;

        for sample in samples {
            writer.write_sample(to_pcm16(*sample)).map_err(|e| {
                MusicError::encoding_failed(format!("Failed to write sample: {}", e))
            })?;
        }

        writer.finalize().map_err(|e| {
            MusicError::encoding_failed(format!("Failed to finalize WAV data: {}", e))
        })?;
    }

    Ok(cursor.into_inner())
}

/// Reads the header of an encoded WAV container.
pub fn inspect_wav(bytes: &[u8]) -> Result<WavInfo> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| MusicError::encoding_failed(format!("Invalid WAV data: {}", e)))?;
    let spec = reader.spec();

    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        frames: reader.duration(),
    })
}

/// Calculates the duration of audio in seconds from a frame count.
pub fn samples_to_duration(frame_count: usize, sample_rate: u32) -> f32 {
    frame_count as f32 / sample_rate as f32
}

fn to_pcm16(sample: f32) -> i16 {
    let clamped = if sample.is_finite() {
        sample.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    (clamped * i16::MAX as f32).round() as i16
}
