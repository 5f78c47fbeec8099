//! Column-to-waveform synthesis.
//!
//! Each image column is scanned top to bottom into a set of tones, and the
//! tones are summed into a fixed-length block of 16-bit PCM.

pub mod synth;
pub mod tone;

// Re-export commonly used items
pub use synth::{quantize, render_block, render_block_into, render_column, Quantization};
pub use tone::{
    attenuation_for, extract_column_tones, frequency_for_row, is_signal, Tone, MAX_ATTENUATION,
    MAX_FREQUENCY, SIGNAL_THRESHOLD,
};

/// Output sample rate (44.1kHz).
pub const SAMPLE_RATE: u32 = 44100;

/// Length of audio produced for one image column, in seconds.
pub const COLUMN_DURATION: f64 = 0.2;

/// Samples per column block: `floor(COLUMN_DURATION * SAMPLE_RATE)`.
pub const BLOCK_LEN: usize = 8820;
