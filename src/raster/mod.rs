//! Raster input module.
//!
//! Decodes PNG and JPEG files into a flat 8-bit RGB pixel buffer, which is
//! the only view of the image the synthesis engine needs.

pub mod decoder;
pub mod format;

use crate::error::{ConvertError, Result};

// Re-export commonly used items
pub use decoder::{decode_image, decoder_for, ImageDecoder, JpegDecoder, PngDecoder};
pub use format::ImageFormat;

/// Bytes per pixel in a [`PixelBuffer`].
pub const BYTES_PER_PIXEL: usize = 3;

/// Decoded image as 8-bit RGB, 3 bytes per pixel, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps raw RGB bytes.
    ///
    /// Fails if either dimension is zero or `data` is not exactly
    /// `width * height * 3` bytes.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ConvertError::invalid_image(format!(
                "Image has no pixels ({}x{})",
                width, height
            )));
        }

        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| ConvertError::invalid_image("Image dimensions overflow"))?;
        if data.len() != expected {
            return Err(ConvertError::invalid_image(format!(
                "Pixel buffer is {} bytes, expected {} for {}x{} RGB",
                data.len(),
                expected,
                width,
                height
            )));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Builds a buffer where every pixel is produced by `f(x, y)`.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> [u8; 3],
    {
        let mut data = Vec::with_capacity(width * height * BYTES_PER_PIXEL);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::new(width, height, data)
    }

    /// Image width in pixels (number of audio columns).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels (maximum tones per column).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw RGB bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the `(r, g, b)` triple at column `x`, row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn pixel(&self, x: usize, y: usize) -> (u8, u8, u8) {
        assert!(x < self.width && y < self.height, "pixel ({}, {}) out of bounds", x, y);
        let idx = (y * self.width + x) * BYTES_PER_PIXEL;
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }
}
