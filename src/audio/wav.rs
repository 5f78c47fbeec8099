//! Streaming RIFF/WAVE writer for 16-bit mono PCM.
//!
//! The RIFF size fields come before the data they describe, so the header is
//! written with a zero data size first, blocks are appended as they are
//! rendered, and the two size fields are patched in place at the end. Nothing
//! but the current block is held in memory.

use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, ErrorCode, Result};
use crate::synthesis::{BLOCK_LEN, SAMPLE_RATE};

/// Number of audio channels (mono).
pub const CHANNELS: u16 = 1;

/// Bits per PCM sample.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Size of the canonical PCM header in bytes.
pub const HEADER_LEN: usize = 44;

/// Byte offset of the RIFF `chunk_size` field.
pub const CHUNK_SIZE_OFFSET: u64 = 4;

/// Byte offset of the `data` subchunk size field.
pub const DATA_SIZE_OFFSET: u64 = 40;

/// Largest data chunk whose RIFF chunk size (`36 + data_size`) still fits in 32 bits.
pub const MAX_DATA_SIZE: u32 = u32::MAX - 36;

const BYTES_PER_SAMPLE: u32 = (BITS_PER_SAMPLE / 8) as u32;

/// The 44-byte header of a PCM WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Size of the sample data in bytes.
    pub data_size: u32,
}

impl WavHeader {
    /// Header for this crate's output format: 44.1kHz, mono, 16-bit.
    pub fn mono16(data_size: u32) -> Self {
        Self {
            channels: CHANNELS,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: BITS_PER_SAMPLE,
            data_size,
        }
    }

    /// Bytes per sample frame.
    pub fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    /// Bytes per second of audio.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    /// RIFF chunk size: the file length minus the 8-byte RIFF preamble.
    pub fn chunk_size(&self) -> u32 {
        36 + self.data_size
    }

    /// Serializes the header, little-endian.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(b"RIFF");
        out[4..8].copy_from_slice(&self.chunk_size().to_le_bytes());
        out[8..12].copy_from_slice(b"WAVE");
        out[12..16].copy_from_slice(b"fmt ");
        out[16..20].copy_from_slice(&16u32.to_le_bytes()); // fmt chunk size
        out[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
        out[22..24].copy_from_slice(&self.channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate().to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align().to_le_bytes());
        out[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out[36..40].copy_from_slice(b"data");
        out[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        out
    }

    /// Parses a canonical 44-byte PCM header.
    ///
    /// Rejects short input, wrong chunk tags, and non-PCM formats. The
    /// `chunk_size` field must agree with `data_size`.
    pub fn parse(bytes: &[u8]) -> io::Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(invalid_data(format!(
                "header is {} bytes, need {}",
                bytes.len(),
                HEADER_LEN
            )));
        }
        if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(invalid_data("missing RIFF/WAVE tags"));
        }
        if &bytes[12..16] != b"fmt " || le_u32(bytes, 16) != 16 {
            return Err(invalid_data("expected a 16-byte fmt chunk"));
        }
        if le_u16(bytes, 20) != 1 {
            return Err(invalid_data("not PCM audio"));
        }
        if &bytes[36..40] != b"data" {
            return Err(invalid_data("missing data chunk"));
        }

        let header = Self {
            channels: le_u16(bytes, 22),
            sample_rate: le_u32(bytes, 24),
            bits_per_sample: le_u16(bytes, 34),
            data_size: le_u32(bytes, 40),
        };

        if le_u32(bytes, 4) != header.data_size.wrapping_add(36) {
            return Err(invalid_data("chunk size does not match data size"));
        }
        Ok(header)
    }
}

/// Returns the data chunk size for `columns` column blocks, if it fits a WAV file.
pub fn data_size_for_columns(columns: usize) -> Option<u32> {
    let bytes = (columns as u64)
        .checked_mul(BLOCK_LEN as u64)?
        .checked_mul(BYTES_PER_SAMPLE as u64)?;
    u32::try_from(bytes).ok().filter(|&size| size <= MAX_DATA_SIZE)
}

/// Totals reported once a stream is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WavSummary {
    /// Samples written across all blocks.
    pub total_samples: u64,
    /// Value written to the `data_size` field.
    pub data_size: u32,
    /// Length of the finished file in bytes.
    pub file_len: u64,
}

/// Appends PCM blocks to a seekable sink and patches the header on finalize.
///
/// The sink must be positioned at offset 0 when the writer is created.
#[derive(Debug)]
pub struct WavStreamWriter<W: Write + Seek> {
    sink: W,
    samples_written: u64,
    scratch: Vec<u8>,
}

impl<W: Write + Seek> WavStreamWriter<W> {
    /// Writes a placeholder header (data size 0) and returns the writer.
    pub fn new(mut sink: W) -> io::Result<Self> {
        sink.write_all(&WavHeader::mono16(0).to_bytes())?;
        Ok(Self {
            sink,
            samples_written: 0,
            scratch: Vec::with_capacity(BLOCK_LEN * BYTES_PER_SAMPLE as usize),
        })
    }

    /// Appends a block of samples directly after the previous one.
    pub fn append_block(&mut self, block: &[i16]) -> io::Result<()> {
        self.scratch.clear();
        for sample in block {
            self.scratch.extend_from_slice(&sample.to_le_bytes());
        }
        self.sink.write_all(&self.scratch)?;
        self.samples_written += block.len() as u64;
        Ok(())
    }

    /// Samples appended so far.
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Patches `chunk_size` and `data_size`, flushes, and returns the sink.
    pub fn finalize(mut self) -> io::Result<(W, WavSummary)> {
        let data_bytes = self.samples_written * BYTES_PER_SAMPLE as u64;
        let data_size = u32::try_from(data_bytes)
            .ok()
            .filter(|&size| size <= MAX_DATA_SIZE)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} bytes of audio exceed the WAV size limit", data_bytes),
                )
            })?;
        let header = WavHeader::mono16(data_size);

        self.sink.seek(SeekFrom::Start(CHUNK_SIZE_OFFSET))?;
        self.sink.write_all(&header.chunk_size().to_le_bytes())?;
        self.sink.seek(SeekFrom::Start(DATA_SIZE_OFFSET))?;
        self.sink.write_all(&data_size.to_le_bytes())?;
        let file_len = self.sink.seek(SeekFrom::End(0))?;
        self.sink.flush()?;

        let summary = WavSummary {
            total_samples: self.samples_written,
            data_size,
            file_len,
        };
        Ok((self.sink, summary))
    }
}

/// Format and length of a WAV file as read back by `hound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Total samples across all channels.
    pub samples: u32,
}

/// Reads a WAV file's format and sample count.
pub fn inspect_wav(path: &Path) -> Result<WavInfo> {
    let reader = hound::WavReader::open(path).map_err(|e| {
        ConvertError::with_source(
            ErrorCode::VerificationFailed,
            format!("Cannot read back {}: {}", path.display(), e),
            e,
        )
    })?;
    let spec = reader.spec();
    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        samples: reader.len(),
    })
}

fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn header_layout_is_canonical() {
        let bytes = WavHeader::mono16(1000).to_bytes();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(le_u32(&bytes, 4), 1036);
        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        assert_eq!(le_u32(&bytes, 16), 16);
        assert_eq!(le_u16(&bytes, 20), 1);
        assert_eq!(le_u16(&bytes, 22), 1);
        assert_eq!(le_u32(&bytes, 24), 44100);
        assert_eq!(le_u32(&bytes, 28), 88200);
        assert_eq!(le_u16(&bytes, 32), 2);
        assert_eq!(le_u16(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(le_u32(&bytes, 40), 1000);
    }

    #[test]
    fn header_parse_round_trip() {
        let header = WavHeader::parse(&WavHeader::mono16(88200).to_bytes()).unwrap();
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.channels, 1);
        assert_eq!(header.bits_per_sample, 16);
        assert_eq!(header.data_size, 88200);
    }

    #[test]
    fn header_parse_rejects_garbage() {
        assert!(WavHeader::parse(b"RIFF").is_err());
        let mut bytes = WavHeader::mono16(4).to_bytes();
        bytes[20] = 3; // IEEE float
        assert!(WavHeader::parse(&bytes).is_err());
        let mut bytes = WavHeader::mono16(4).to_bytes();
        bytes[4] = 0;
        assert!(WavHeader::parse(&bytes).is_err());
    }

    #[test]
    fn stream_backpatches_sizes() {
        let mut writer = WavStreamWriter::new(Cursor::new(Vec::new())).unwrap();
        writer.append_block(&[1, -1, 2]).unwrap();
        writer.append_block(&[i16::MAX, i16::MIN]).unwrap();
        assert_eq!(writer.samples_written(), 5);

        let (cursor, summary) = writer.finalize().unwrap();
        let bytes = cursor.into_inner();
        assert_eq!(bytes.len(), 44 + 10);
        assert_eq!(summary.total_samples, 5);
        assert_eq!(summary.data_size, 10);
        assert_eq!(summary.file_len, 54);

        let header = WavHeader::parse(&bytes).unwrap();
        assert_eq!(header.data_size, 10);
        assert_eq!(le_u32(&bytes, 4), 46);
        // Samples follow the header with no framing.
        assert_eq!(&bytes[44..46], &1i16.to_le_bytes());
        assert_eq!(&bytes[52..54], &i16::MIN.to_le_bytes());
    }

    #[test]
    fn empty_stream_is_valid_header() {
        let writer = WavStreamWriter::new(Cursor::new(Vec::new())).unwrap();
        let (cursor, summary) = writer.finalize().unwrap();
        assert_eq!(summary.data_size, 0);
        assert_eq!(cursor.into_inner(), WavHeader::mono16(0).to_bytes().to_vec());
    }

    #[test]
    fn hound_reads_streamed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = WavStreamWriter::new(std::io::BufWriter::new(file)).unwrap();
        writer.append_block(&[0, 100, -100, 200]).unwrap();
        writer.finalize().unwrap();

        let info = inspect_wav(&path).unwrap();
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.channels, 1);
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(info.samples, 4);

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 100, -100, 200]);
    }

    #[test]
    fn data_size_limits() {
        assert_eq!(data_size_for_columns(0), Some(0));
        assert_eq!(data_size_for_columns(2), Some(2 * 8820 * 2));
        assert_eq!(data_size_for_columns(1_000_000), None);
    }
}
