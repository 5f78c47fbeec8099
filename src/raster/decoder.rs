//! Image decoders producing [`PixelBuffer`]s.
//!
//! Decoding normalises every input to 8-bit RGB: alpha is dropped, palette
//! and grayscale images are expanded, and 16-bit channels keep their high
//! byte (libpng's `strip_16`), so a channel only counts as signal if its top
//! 8 bits do.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::DynamicImage;
use tracing::debug;

use super::format::ImageFormat;
use super::PixelBuffer;
use crate::error::{ConvertError, Result};

/// A decoder for one image format.
pub trait ImageDecoder {
    /// The format this decoder reads.
    fn format(&self) -> ImageFormat;

    /// Decodes the file at `path` into an RGB pixel buffer.
    fn decode(&self, path: &Path) -> Result<PixelBuffer>;
}

/// PNG decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngDecoder;

/// JPEG decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegDecoder;

impl ImageDecoder for PngDecoder {
    fn format(&self) -> ImageFormat {
        ImageFormat::Png
    }

    fn decode(&self, path: &Path) -> Result<PixelBuffer> {
        load_rgb(path, image::ImageFormat::Png)
    }
}

impl ImageDecoder for JpegDecoder {
    fn format(&self) -> ImageFormat {
        ImageFormat::Jpeg
    }

    fn decode(&self, path: &Path) -> Result<PixelBuffer> {
        load_rgb(path, image::ImageFormat::Jpeg)
    }
}

/// Returns the decoder for a format.
pub fn decoder_for(format: ImageFormat) -> Box<dyn ImageDecoder> {
    match format {
        ImageFormat::Png => Box::new(PngDecoder),
        ImageFormat::Jpeg => Box::new(JpegDecoder),
    }
}

/// Detects the format of `path` and decodes it.
///
/// An unsupported format is reported before any decoding is attempted.
pub fn decode_image(path: &Path, detect_by_content: bool) -> Result<PixelBuffer> {
    let format = ImageFormat::detect(path, detect_by_content)?;
    debug!(path = %path.display(), %format, "decoding image");
    decoder_for(format).decode(path)
}

fn load_rgb(path: &Path, format: image::ImageFormat) -> Result<PixelBuffer> {
    let file = File::open(path).map_err(|e| ConvertError::decode_failed(path, e))?;
    let img = image::load(BufReader::new(file), format)
        .map_err(|e| ConvertError::decode_failed(path, e))?;

    let (width, height) = (img.width() as usize, img.height() as usize);
    PixelBuffer::new(width, height, rgb_bytes(img))
}

/// Flattens an image to RGB8 bytes, truncating 16-bit channels.
fn rgb_bytes(img: DynamicImage) -> Vec<u8> {
    match img {
        DynamicImage::ImageRgb16(buf) => buf.pixels().flat_map(|p| p.0.map(high_byte)).collect(),
        DynamicImage::ImageRgba16(buf) => buf
            .pixels()
            .flat_map(|p| {
                let [r, g, b, _] = p.0;
                [r, g, b].map(high_byte)
            })
            .collect(),
        DynamicImage::ImageLuma16(buf) => {
            buf.pixels().flat_map(|p| [high_byte(p.0[0]); 3]).collect()
        }
        DynamicImage::ImageLumaA16(buf) => {
            buf.pixels().flat_map(|p| [high_byte(p.0[0]); 3]).collect()
        }
        other => other.to_rgb8().into_raw(),
    }
}

fn high_byte(value: u16) -> u8 {
    (value >> 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::synthesis::is_signal;
    use image::{ImageBuffer, Luma, LumaA, Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn decodes_rgb_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rgb.png");
        let img = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8 * 50, y as u8 * 100, 9]));
        img.save(&path).unwrap();

        let buf = PngDecoder.decode(&path).unwrap();
        assert_eq!(buf.width(), 3);
        assert_eq!(buf.height(), 2);
        assert_eq!(buf.pixel(2, 1), (100, 100, 9));
    }

    #[test]
    fn strips_alpha_channel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rgba.png");
        let img = RgbaImage::from_pixel(2, 2, Rgba([200, 20, 30, 0]));
        img.save(&path).unwrap();

        let buf = decode_image(&path, false).unwrap();
        assert_eq!(buf.as_bytes().len(), 2 * 2 * 3);
        assert_eq!(buf.pixel(1, 1), (200, 20, 30));
    }

    #[test]
    fn sixteen_bit_channels_keep_high_byte() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deep.png");
        // Rounding would give (11, 128, 0); truncation gives (10, 128, 0).
        let img: ImageBuffer<Rgb<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(1, 1, Rgb([0x0AFF, 0x80FF, 0]));
        img.save(&path).unwrap();

        let buf = decode_image(&path, false).unwrap();
        assert_eq!(buf.pixel(0, 0), (10, 128, 0));
        let (r, g, b) = buf.pixel(0, 0);
        assert!(!is_signal(r, g, b));
    }

    #[test]
    fn sixteen_bit_full_scale() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("full.png");
        let img: ImageBuffer<Rgb<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(1, 1, Rgb([u16::MAX, 0, u16::MAX]));
        img.save(&path).unwrap();

        let buf = decode_image(&path, false).unwrap();
        assert_eq!(buf.pixel(0, 0), (255, 0, 255));
    }

    #[test]
    fn sixteen_bit_alpha_and_gray_truncate() {
        let dir = tempdir().unwrap();

        let rgba_path = dir.path().join("rgba16.png");
        let rgba: ImageBuffer<Rgba<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(1, 1, Rgba([0x12FF, 0x0180, 0xFFFF, 0]));
        rgba.save(&rgba_path).unwrap();
        assert_eq!(decode_image(&rgba_path, false).unwrap().pixel(0, 0), (0x12, 0x01, 0xFF));

        let gray_path = dir.path().join("gray16.png");
        let gray: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(1, 1, Luma([0x4DC0]));
        gray.save(&gray_path).unwrap();
        assert_eq!(decode_image(&gray_path, false).unwrap().pixel(0, 0), (0x4D, 0x4D, 0x4D));

        let gray_alpha_path = dir.path().join("graya16.png");
        let gray_alpha: ImageBuffer<LumaA<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(1, 1, LumaA([0x0AFF, 0xFFFF]));
        gray_alpha.save(&gray_alpha_path).unwrap();
        assert_eq!(decode_image(&gray_alpha_path, false).unwrap().pixel(0, 0), (10, 10, 10));
    }

    #[test]
    fn expands_grayscale() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let img = image::GrayImage::from_pixel(1, 1, image::Luma([77]));
        img.save(&path).unwrap();

        let buf = decode_image(&path, false).unwrap();
        assert_eq!(buf.pixel(0, 0), (77, 77, 77));
    }

    #[test]
    fn decodes_jpeg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("solid.jpg");
        let img = RgbImage::from_pixel(8, 8, Rgb([128, 128, 128]));
        img.save(&path).unwrap();

        let buf = JpegDecoder.decode(&path).unwrap();
        assert_eq!((buf.width(), buf.height()), (8, 8));
        let (r, g, b) = buf.pixel(4, 4);
        for c in [r, g, b] {
            assert!((c as i32 - 128).abs() <= 4, "channel {} drifted", c);
        }
    }

    #[test]
    fn corrupt_file_is_decode_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = decode_image(&path, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::DecodeFailed);
    }

    #[test]
    fn decoder_for_matches_format() {
        assert_eq!(decoder_for(ImageFormat::Png).format(), ImageFormat::Png);
        assert_eq!(decoder_for(ImageFormat::Jpeg).format(), ImageFormat::Jpeg);
    }
}
