//! Column tone extraction.
//!
//! Row position sets pitch (top row highest) and brightness sets loudness.

use crate::raster::PixelBuffer;

/// Frequency of the pitch ramp's upper end, in Hz.
pub const MAX_FREQUENCY: f64 = 22000.0;

/// Attenuation of a black pixel. White comes out at 4.25 * 3 / 768, just above 0.
pub const MAX_ATTENUATION: f64 = 4.25;

/// Channel level a pixel must exceed to count as signal.
pub const SIGNAL_THRESHOLD: u8 = 10;

/// A sine tone derived from one qualifying pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Pitch in Hz, in `[0, 22000]`.
    pub frequency: f64,
    /// Loudness reduction exponent in `[0, 4.25]`; amplitude scales as `10^-attenuation`.
    pub attenuation: f64,
}

/// Returns true if a pixel produces a tone.
///
/// Strong red counts on its own; green and blue only count together.
pub fn is_signal(r: u8, g: u8, b: u8) -> bool {
    r > SIGNAL_THRESHOLD || (g > SIGNAL_THRESHOLD && b > SIGNAL_THRESHOLD)
}

/// Attenuation for a pixel: brighter means louder.
pub fn attenuation_for(r: u8, g: u8, b: u8) -> f64 {
    let brightness = r as f64 + g as f64 + b as f64;
    MAX_ATTENUATION - MAX_ATTENUATION * brightness / 768.0
}

/// Frequency for row `y` of an image `height` rows tall.
///
/// Linear ramp from just under 22kHz at the top to just above 0 at the bottom,
/// floored to whole Hz.
pub fn frequency_for_row(y: usize, height: usize) -> f64 {
    let position = (y + 1) as f64 / (height + 1) as f64;
    (MAX_FREQUENCY - position * MAX_FREQUENCY).floor()
}

/// Collects the tones for column `x`, top row first.
///
/// A column with no qualifying pixels yields an empty set.
///
/// # Panics
///
/// Panics if `x >= pixels.width()`.
pub fn extract_column_tones(pixels: &PixelBuffer, x: usize) -> Vec<Tone> {
    let height = pixels.height();
    let mut tones = Vec::with_capacity(height);

    for y in 0..height {
        let (r, g, b) = pixels.pixel(x, y);
        if !is_signal(r, g, b) {
            continue;
        }
        tones.push(Tone {
            frequency: frequency_for_row(y, height),
            attenuation: attenuation_for(r, g, b),
        });
    }

    tones
}
