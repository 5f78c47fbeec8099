//! Additive synthesis of one column block.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::tone::{extract_column_tones, Tone};
use super::{BLOCK_LEN, SAMPLE_RATE};
use crate::raster::PixelBuffer;

/// Scale from a unit-amplitude sample to 16-bit PCM.
const PCM_SCALE: f64 = 32767.0;

/// Gain applied to every tone before attenuation.
const TONE_GAIN: f64 = 10.0;

/// How out-of-range sample values are converted to 16-bit PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Quantization {
    /// Round to nearest and saturate at the i16 limits.
    #[default]
    Clamp,
    /// Truncate toward zero and wrap modulo 2^16.
    /// Matches the C cast `(int16_t)(value * 32767.0)`, overflow distortion included.
    Wrap,
}

impl Quantization {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Quantization::Clamp => "clamp",
            Quantization::Wrap => "wrap",
        }
    }

    /// Parses a mode from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "clamp" | "saturate" => Some(Quantization::Clamp),
            "wrap" | "legacy" => Some(Quantization::Wrap),
            _ => None,
        }
    }
}

impl std::fmt::Display for Quantization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Converts a unit-scale sample value to 16-bit PCM.
pub fn quantize(value: f64, mode: Quantization) -> i16 {
    let scaled = value * PCM_SCALE;
    match mode {
        Quantization::Clamp => scaled.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16,
        Quantization::Wrap => (scaled as i32) as i16,
    }
}

/// Renders one column block of exactly [`BLOCK_LEN`] samples.
pub fn render_block(tones: &[Tone], mode: Quantization) -> Vec<i16> {
    let mut block = vec![0i16; BLOCK_LEN];
    render_block_into(tones, mode, &mut block);
    block
}

/// Renders into `out`, which is resized to [`BLOCK_LEN`].
///
/// The block is the mean of all tones, not their sum, so dense columns come
/// out quieter rather than overflowing. No tones means silence.
pub fn render_block_into(tones: &[Tone], mode: Quantization, out: &mut Vec<i16>) {
    out.clear();
    out.resize(BLOCK_LEN, 0);
    if tones.is_empty() {
        return;
    }

    // Operation order matters for bit parity in Wrap mode: sin * gain / 10^a.
    let divisors: Vec<f64> = tones.iter().map(|tone| 10f64.powf(tone.attenuation)).collect();
    let count = tones.len() as f64;

    for (pos, sample) in out.iter_mut().enumerate() {
        let t = pos as f64 / SAMPLE_RATE as f64;
        let mut value = 0.0;
        for (tone, divisor) in tones.iter().zip(&divisors) {
            value += (TAU * tone.frequency * t).sin() * TONE_GAIN / divisor;
        }
        *sample = quantize(value / count, mode);
    }
}

/// Extracts and renders column `x` in one step.
///
/// `x` must be less than `pixels.width()`; see [`extract_column_tones`].
pub fn render_column(pixels: &PixelBuffer, x: usize, mode: Quantization) -> Vec<i16> {
    render_block(&extract_column_tones(pixels, x), mode)
}
