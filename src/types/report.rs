//! ConversionReport type describing a finished conversion.
//!
//! The report carries a fingerprint of the PCM data so that two runs over the
//! same image (or a sequential and a threaded run) can be compared cheaply.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::audio::WavSummary;
use crate::synthesis::SAMPLE_RATE;

/// Summary of one image-to-WAV conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Source image path.
    pub input: PathBuf,

    /// Written WAV path.
    pub output: PathBuf,

    /// Image width in pixels; one audio column per pixel column.
    pub width: usize,

    /// Image height in pixels.
    pub height: usize,

    /// Columns that contained no qualifying pixel and rendered as silence.
    pub silent_columns: usize,

    /// Total 16-bit samples in the data chunk.
    pub total_samples: u64,

    /// Size of the data chunk in bytes.
    pub data_size: u32,

    /// Length of the WAV file in bytes.
    pub file_len: u64,

    /// Audio duration in seconds.
    pub duration_sec: f64,

    /// Wall-clock time spent converting, in seconds.
    pub elapsed_sec: f64,

    /// Threads used to render columns.
    pub threads: usize,

    /// First 16 hex characters of the SHA256 of the PCM data.
    pub pcm_sha256: String,
}

impl ConversionReport {
    /// Assembles a report from the finished stream's totals.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        input: PathBuf,
        output: PathBuf,
        width: usize,
        height: usize,
        silent_columns: usize,
        summary: WavSummary,
        elapsed_sec: f64,
        threads: usize,
        pcm_sha256: String,
    ) -> Self {
        Self {
            input,
            output,
            width,
            height,
            silent_columns,
            total_samples: summary.total_samples,
            data_size: summary.data_size,
            file_len: summary.file_len,
            duration_sec: samples_to_duration(summary.total_samples),
            elapsed_sec,
            threads,
            pcm_sha256,
        }
    }
}

/// Calculates the duration of mono audio in seconds from sample count.
pub fn samples_to_duration(sample_count: u64) -> f64 {
    sample_count as f64 / SAMPLE_RATE as f64
}

/// Running SHA256 over PCM samples in little-endian byte order.
#[derive(Clone, Default)]
pub struct PcmFingerprint {
    hasher: Sha256,
}

impl PcmFingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one block of samples.
    pub fn update(&mut self, block: &[i16]) {
        for sample in block {
            self.hasher.update(sample.to_le_bytes());
        }
    }

    /// Returns the first 8 bytes of the digest as 16 hex characters.
    pub fn finish(self) -> String {
        let result = self.hasher.finalize();
        hex::encode(&result[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_deterministic() {
        let mut a = PcmFingerprint::new();
        a.update(&[1, 2, 3]);
        let mut b = PcmFingerprint::new();
        b.update(&[1, 2, 3]);

        let id = a.finish();
        assert_eq!(id, b.finish());
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_ignores_block_boundaries() {
        let mut whole = PcmFingerprint::new();
        whole.update(&[5, -5, 7, 9]);
        let mut split = PcmFingerprint::new();
        split.update(&[5, -5]);
        split.update(&[7, 9]);
        assert_eq!(whole.finish(), split.finish());
    }

    #[test]
    fn fingerprint_varies_with_samples() {
        let mut a = PcmFingerprint::new();
        a.update(&[0, 1]);
        let mut b = PcmFingerprint::new();
        b.update(&[1, 0]);
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn duration_calculation() {
        assert_eq!(samples_to_duration(44100), 1.0);
        assert_eq!(samples_to_duration(8820), 0.2);
    }

    #[test]
    fn report_serializes() {
        let summary = WavSummary {
            total_samples: 17640,
            data_size: 35280,
            file_len: 35324,
        };
        let report = ConversionReport::new(
            PathBuf::from("in.png"),
            PathBuf::from("in.png.wav"),
            2,
            1,
            1,
            summary,
            0.01,
            1,
            "00".repeat(8),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["width"], 2);
        assert_eq!(json["data_size"], 35280);
        assert_eq!(json["duration_sec"], 0.4);
    }
}
