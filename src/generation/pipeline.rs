//! Conversion pipeline.
//!
//! Decodes the image, then streams one rendered block per column into the
//! WAV writer, left to right, and patches the header sizes at the end.

use std::io::{Seek, Write};
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use super::queue::render_columns;
use crate::audio::{
    data_size_for_columns, inspect_wav, BlockSink, OutputFile, WavHeader, WavStreamWriter, WavSummary,
    BITS_PER_SAMPLE, CHANNELS, HEADER_LEN,
};
use crate::config::ConvertConfig;
use crate::error::{ConvertError, Result};
use crate::raster::{decode_image, PixelBuffer};
use crate::synthesis::{BLOCK_LEN, SAMPLE_RATE};
use crate::types::{ConversionReport, PcmFingerprint};

/// Converts an image file to a WAV file.
///
/// # Example
///
/// ```ignore
/// use image_spectrogram::{convert_file, ConvertConfig};
///
/// let report = convert_file(
///     Path::new("photo.png"),
///     Path::new("photo.png.wav"),
///     &ConvertConfig::default(),
/// )?;
/// ```
pub fn convert_file(input: &Path, output: &Path, config: &ConvertConfig) -> Result<ConversionReport> {
    convert_file_with_progress(input, output, config, |_, _| {})
}

/// Converts an image file to a WAV file with progress callback.
///
/// `on_progress` receives (columns_written, columns_total) after each column.
///
/// The image is decoded before the output path is touched, so format and
/// decode errors never leave a file behind.
pub fn convert_file_with_progress<F>(
    input: &Path,
    output: &Path,
    config: &ConvertConfig,
    on_progress: F,
) -> Result<ConversionReport>
where
    F: FnMut(usize, usize),
{
    config.ensure_valid()?;

    let pixels = decode_image(input, config.detect_by_content)?;
    info!(
        input = %input.display(),
        width = pixels.width(),
        height = pixels.height(),
        "decoded image"
    );

    convert_pixels(&pixels, input, output, config, on_progress)
}

/// Converts an already decoded image to a WAV file.
///
/// `input` is only recorded in the report. An image too wide for the WAV
/// size fields is rejected before `output` is created.
pub fn convert_pixels<F>(
    pixels: &PixelBuffer,
    input: &Path,
    output: &Path,
    config: &ConvertConfig,
    on_progress: F,
) -> Result<ConversionReport>
where
    F: FnMut(usize, usize),
{
    check_convertible(pixels, config)?;
    let out = OutputFile::create(output, config.partial_file)?;
    convert_into(pixels, input, out, config, on_progress)
}

/// Streams every column of `pixels` into `sink`, then finishes it.
///
/// The first failure aborts the sink, so it never completes with a partial
/// data chunk.
pub fn convert_into<S, F>(
    pixels: &PixelBuffer,
    input: &Path,
    mut sink: S,
    config: &ConvertConfig,
    mut on_progress: F,
) -> Result<ConversionReport>
where
    S: BlockSink,
    F: FnMut(usize, usize),
{
    if let Err(e) = check_convertible(pixels, config) {
        sink.abort();
        return Err(e);
    }
    let start = Instant::now();
    let width = pixels.width();
    let threads = config.effective_threads().min(width).max(1);
    let mut fingerprint = PcmFingerprint::new();
    let mut silent_columns = 0;

    let streamed = render_columns(pixels, threads, config.quantization, |column| {
        sink.append_block(&column.samples)?;
        fingerprint.update(&column.samples);
        if column.is_silent() {
            silent_columns += 1;
        }
        on_progress(column.index + 1, width);
        Ok(())
    });

    if let Err(e) = streamed {
        sink.abort();
        return Err(e);
    }

    let output = sink.path().to_path_buf();
    let summary = sink.finish()?;
    let elapsed = start.elapsed().as_secs_f64();
    info!(
        output = %output.display(),
        samples = summary.total_samples,
        bytes = summary.file_len,
        elapsed_sec = elapsed,
        "wrote WAV"
    );

    Ok(ConversionReport::new(
        input.to_path_buf(),
        output,
        width,
        pixels.height(),
        silent_columns,
        summary,
        elapsed,
        threads,
        fingerprint.finish(),
    ))
}

/// Streams the WAV rendering of `pixels` into any seekable sink.
///
/// The sink must be positioned at offset 0. Returns the sink with the
/// finished file in it.
pub fn render_to_writer<W>(
    pixels: &PixelBuffer,
    sink: W,
    config: &ConvertConfig,
) -> Result<(W, WavSummary)>
where
    W: Write + Seek,
{
    check_convertible(pixels, config)?;
    let mut writer = WavStreamWriter::new(sink)?;
    render_columns(
        pixels,
        config.effective_threads(),
        config.quantization,
        |column| Ok(writer.append_block(&column.samples)?),
    )?;
    Ok(writer.finalize()?)
}

fn check_convertible(pixels: &PixelBuffer, config: &ConvertConfig) -> Result<()> {
    config.ensure_valid()?;
    if data_size_for_columns(pixels.width()).is_none() {
        return Err(ConvertError::output_too_large(pixels.width()));
    }
    Ok(())
}

/// Total samples a conversion of `columns` columns produces.
pub fn expected_samples(columns: usize) -> u64 {
    columns as u64 * BLOCK_LEN as u64
}

/// Checks a written file against its report.
///
/// Parses the header directly and reads the file back with `hound`; both
/// must agree with the report on format and size.
pub fn verify_output(report: &ConversionReport) -> Result<()> {
    let unreadable = |e: std::io::Error| {
        ConvertError::verification_failed(format!("Cannot read {}: {}", report.output.display(), e))
    };

    let bytes_on_disk = std::fs::metadata(&report.output).map_err(unreadable)?.len();
    if bytes_on_disk != report.file_len {
        return Err(ConvertError::verification_failed(format!(
            "{} is {} bytes, expected {}",
            report.output.display(),
            bytes_on_disk,
            report.file_len
        )));
    }

    let mut head = [0u8; HEADER_LEN];
    {
        use std::io::Read;
        let mut file = std::fs::File::open(&report.output).map_err(unreadable)?;
        file.read_exact(&mut head).map_err(unreadable)?;
    }
    let header = WavHeader::parse(&head).map_err(|e| {
        ConvertError::verification_failed(format!("Bad header in {}: {}", report.output.display(), e))
    })?;
    if header.data_size != report.data_size {
        return Err(ConvertError::verification_failed(format!(
            "header data size {} does not match {} written",
            header.data_size, report.data_size
        )));
    }

    let info = inspect_wav(&report.output)?;
    let format_ok = info.channels == CHANNELS
        && info.sample_rate == SAMPLE_RATE
        && info.bits_per_sample == BITS_PER_SAMPLE;
    if !format_ok || info.samples as u64 != report.total_samples {
        return Err(ConvertError::verification_failed(format!(
            "read back {} ch / {} Hz / {} bit / {} samples",
            info.channels, info.sample_rate, info.bits_per_sample, info.samples
        )));
    }

    debug!(output = %report.output.display(), "verified output");
    Ok(())
}
