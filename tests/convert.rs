//! End-to-end conversions through real image files.

use std::path::Path;

use image::{Rgb, RgbImage};
use image_spectrogram::audio::{WavHeader, HEADER_LEN};
use image_spectrogram::synthesis::BLOCK_LEN;
use image_spectrogram::{convert_file, verify_output, ConvertConfig, ErrorCode};
use tempfile::tempdir;

fn read_samples(path: &Path) -> Vec<i16> {
    let mut reader = hound::WavReader::open(path).unwrap();
    reader.samples::<i16>().map(|s| s.unwrap()).collect()
}

#[test]
fn png_file_length_and_header() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("gradient.png");
    let output = dir.path().join("gradient.wav");
    RgbImage::from_fn(6, 4, |x, y| Rgb([(x * 40) as u8, (y * 60) as u8, 120]))
        .save(&input)
        .unwrap();

    let report = convert_file(&input, &output, &ConvertConfig::default()).unwrap();

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(bytes.len(), 44 + 6 * BLOCK_LEN * 2);
    assert_eq!(report.file_len, bytes.len() as u64);

    let header = WavHeader::parse(&bytes[..HEADER_LEN]).unwrap();
    assert_eq!(header.sample_rate, 44100);
    assert_eq!(header.channels, 1);
    assert_eq!(header.bits_per_sample, 16);
    assert_eq!(header.data_size as usize, bytes.len() - 44);
    assert_eq!(
        u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
        36 + header.data_size
    );

    let spec = hound::WavReader::open(&output).unwrap().spec();
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);

    verify_output(&report).unwrap();
}

#[test]
fn single_white_pixel_is_eleven_khz() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("white.png");
    let output = dir.path().join("white.wav");
    RgbImage::from_pixel(1, 1, Rgb([255, 255, 255])).save(&input).unwrap();

    convert_file(&input, &output, &ConvertConfig::default()).unwrap();
    let samples = read_samples(&output);
    assert_eq!(samples.len(), BLOCK_LEN);

    // 11000 Hz at 44.1 kHz: about 4 samples per period, far above full scale.
    assert_eq!(samples[0], 0);
    assert_eq!(samples[1], i16::MAX);
    assert_eq!(samples[3], i16::MIN);
    let zero_crossings = samples
        .windows(2)
        .filter(|w| (w[0] >= 0) != (w[1] >= 0))
        .count();
    let expected = 2.0 * 11000.0 * 0.2;
    assert!((zero_crossings as f64 - expected).abs() < expected * 0.05);
}

#[test]
fn black_image_is_all_zero() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("black.png");
    let output = dir.path().join("black.wav");
    RgbImage::new(3, 7).save(&input).unwrap();

    let report = convert_file(&input, &output, &ConvertConfig::default()).unwrap();
    assert_eq!(report.silent_columns, 3);
    assert!(read_samples(&output).iter().all(|&s| s == 0));
}

#[test]
fn second_column_silent() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("half.png");
    let output = dir.path().join("half.wav");
    RgbImage::from_fn(2, 5, |x, _| if x == 0 { Rgb([200, 200, 200]) } else { Rgb([0, 0, 0]) })
        .save(&input)
        .unwrap();

    convert_file(&input, &output, &ConvertConfig::default()).unwrap();
    let samples = read_samples(&output);
    assert!(samples[..BLOCK_LEN].iter().any(|&s| s != 0));
    assert!(samples[BLOCK_LEN..].iter().all(|&s| s == 0));
}

#[test]
fn jpeg_input_converts() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("photo.JPG");
    let output = dir.path().join("photo.wav");
    RgbImage::from_pixel(4, 4, Rgb([180, 90, 60]))
        .save_with_format(&input, image::ImageFormat::Jpeg)
        .unwrap();

    let report = convert_file(&input, &output, &ConvertConfig::default()).unwrap();
    assert_eq!(report.width, 4);
    assert_eq!(report.silent_columns, 0);
}

#[test]
fn unsupported_extension_touches_nothing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("picture.bmp");
    let output = dir.path().join("picture.wav");
    std::fs::write(&input, b"BM").unwrap();

    let err = convert_file(&input, &output, &ConvertConfig::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnsupportedFormat);
    assert!(!output.exists());
}

#[test]
fn corrupt_image_touches_nothing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("broken.png");
    let output = dir.path().join("broken.wav");
    std::fs::write(&input, b"\x89PNG\r\n\x1a\nnot really").unwrap();

    let err = convert_file(&input, &output, &ConvertConfig::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::DecodeFailed);
    assert!(!output.exists());
}

#[test]
fn sniffing_accepts_misnamed_png() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("misnamed.dat");
    let output = dir.path().join("misnamed.wav");
    RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]))
        .save_with_format(&input, image::ImageFormat::Png)
        .unwrap();

    let err = convert_file(&input, &output, &ConvertConfig::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnsupportedFormat);

    let config = ConvertConfig {
        detect_by_content: true,
        ..Default::default()
    };
    let report = convert_file(&input, &output, &config).unwrap();
    assert_eq!(report.width, 2);
}

#[test]
fn unwritable_output_is_open_failure() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("ok.png");
    RgbImage::from_pixel(1, 1, Rgb([255, 0, 0])).save(&input).unwrap();
    let output = dir.path().join("missing").join("out.wav");

    let err = convert_file(&input, &output, &ConvertConfig::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::OutputOpenFailed);
}

#[test]
fn threaded_conversion_matches_sequential() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("noise.png");
    RgbImage::from_fn(31, 12, |x, y| {
        Rgb([((x * 37 + y * 11) % 256) as u8, ((x * 5) % 256) as u8, ((y * 23) % 256) as u8])
    })
    .save(&input)
    .unwrap();

    let seq = convert_file(&input, &dir.path().join("seq.wav"), &ConvertConfig::default()).unwrap();
    let config = ConvertConfig {
        threads: Some(6),
        ..Default::default()
    };
    let par = convert_file(&input, &dir.path().join("par.wav"), &config).unwrap();

    assert_eq!(seq.pcm_sha256, par.pcm_sha256);
    assert_eq!(
        std::fs::read(dir.path().join("seq.wav")).unwrap(),
        std::fs::read(dir.path().join("par.wav")).unwrap()
    );
}
