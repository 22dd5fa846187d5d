//! Synthetic meditation tone renderer.
//!
//! Produces interleaved stereo samples: slowly struck bell tones with
//! exponential decay over a soft drone, a quiet filtered noise bed and an
//! optional binaural pair (left carrier, right carrier + beat frequency).
//! The output depends only on the [`ToneSpec`], so identical specs render
//! identical buffers.

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

use super::wav::CHANNELS;

/// Base frequencies of the struck bells, cycled one per bar.
pub const BASE_FREQUENCIES: [f64; 4] = [174.0, 285.0, 396.0, 528.0];

/// Carrier frequency of the binaural pair in Hz.
pub const BINAURAL_CARRIER_HZ: f64 = 200.0;

const BELL_DECAY_SEC: f64 = 2.5;
const OVERTONE_RATIO: f64 = 2.76;
const OVERTONE_DECAY_SEC: f64 = 0.8;
const BELL_GAIN: f64 = 0.35;
const DRONE_GAIN: f64 = 0.12;
const DRONE_LFO_HZ: f64 = 0.05;
const BINAURAL_GAIN: f64 = 0.08;
const NOISE_GAIN: f64 = 0.03;
const NOISE_SMOOTHING: f64 = 0.02;
const MASTER_GAIN: f64 = 0.8;
const MAX_FADE_SEC: f64 = 0.5;

/// Parameters of one rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSpec {
    pub sample_rate: u32,
    pub duration_sec: u32,
    /// Tempo; one bell is struck per four beats.
    pub bpm: u32,
    /// Beat frequency of the binaural pair, if any.
    pub binaural_hz: Option<f32>,
    /// Seed for the noise bed.
    pub seed: u64,
}

impl ToneSpec {
    /// Number of sample frames the rendering produces.
    pub fn frame_count(&self) -> usize {
        self.duration_sec as usize * self.sample_rate as usize
    }
}

/// Derives a rendering seed from prompt text.
///
/// The seed is the first 8 bytes of the SHA256 of the prompt, little-endian.
pub fn seed_from_prompt(prompt: &str) -> u64 {
    let digest = Sha256::digest(prompt.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Renders the tone bed described by `spec` as interleaved stereo samples.
///
/// The returned buffer holds exactly `frame_count() * CHANNELS` samples, all
/// within [-1.0, 1.0].
pub fn render_tones(spec: &ToneSpec) -> Vec<f32> {
    let frames = spec.frame_count();
    let mut out = Vec::with_capacity(frames * CHANNELS as usize);
    if frames == 0 || spec.sample_rate == 0 {
        return out;
    }

    let sr = spec.sample_rate as f64;
    let bpm = spec.bpm.clamp(20, 240) as f64;
    let bar_sec = 4.0 * 60.0 / bpm;
    let total_sec = frames as f64 / sr;
    let fade_sec = MAX_FADE_SEC.min(total_sec / 4.0);

    let mut rng = ChaCha8Rng::seed_from_u64(spec.seed);
    let mut noise = [0.0f64; 2];

    for n in 0..frames {
        let t = n as f64 / sr;

        let (bell_l, bell_r) = bells(t, bar_sec);

        let lfo = 0.5 + 0.5 * (TAU * DRONE_LFO_HZ * t).sin();
        let root = BASE_FREQUENCIES[0] / 2.0;
        let drone = DRONE_GAIN
            * lfo
            * ((TAU * root * t).sin() + 0.5 * (TAU * root * 1.5 * t).sin());

        let (bin_l, bin_r) = match spec.binaural_hz {
            Some(beat) => (
                BINAURAL_GAIN * (TAU * BINAURAL_CARRIER_HZ * t).sin(),
                BINAURAL_GAIN * (TAU * (BINAURAL_CARRIER_HZ + beat as f64) * t).sin(),
            ),
            None => (0.0, 0.0),
        };

        for state in noise.iter_mut() {
            let white: f64 = rng.gen_range(-1.0..=1.0);
            *state += NOISE_SMOOTHING * (white - *state);
        }

        let envelope = fade(t, total_sec, fade_sec);
        let left = MASTER_GAIN * envelope * (bell_l + drone + bin_l + NOISE_GAIN * noise[0]);
        let right = MASTER_GAIN * envelope * (bell_r + drone + bin_r + NOISE_GAIN * noise[1]);

        out.push(left.clamp(-1.0, 1.0) as f32);
        out.push(right.clamp(-1.0, 1.0) as f32);
    }

    out
}

/// Sums the current and previous bell so a new strike never cuts off the
/// tail of the last one. Bells alternate slightly left and right.
fn bells(t: f64, bar_sec: f64) -> (f64, f64) {
    let bar = (t / bar_sec).floor() as usize;
    let mut left = 0.0;
    let mut right = 0.0;

    for index in [Some(bar), bar.checked_sub(1)].into_iter().flatten() {
        let since = t - index as f64 * bar_sec;
        let freq = BASE_FREQUENCIES[index % BASE_FREQUENCIES.len()];
        let tone = (TAU * freq * since).sin() * (-since / BELL_DECAY_SEC).exp()
            + 0.3
                * (TAU * freq * OVERTONE_RATIO * since).sin()
                * (-since / OVERTONE_DECAY_SEC).exp();
        let (pan_l, pan_r) = if index % 2 == 0 { (0.6, 0.4) } else { (0.4, 0.6) };
        left += BELL_GAIN * pan_l * tone;
        right += BELL_GAIN * pan_r * tone;
    }

    (left, right)
}

fn fade(t: f64, total_sec: f64, fade_sec: f64) -> f64 {
    if fade_sec <= 0.0 {
        return 1.0;
    }
    let fade_in = (t / fade_sec).min(1.0);
    let fade_out = ((total_sec - t) / fade_sec).min(1.0);
    fade_in.min(fade_out).max(0.0)
}
