//! Input format detection.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{ConvertError, Result};

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Supported input image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Portable Network Graphics.
    Png,
    /// JPEG / JFIF.
    Jpeg,
}

impl ImageFormat {
    /// Returns the string representation of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    /// Detects the format from a file extension, ignoring case.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }

    /// Detects the format from leading magic bytes.
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(PNG_MAGIC) {
            Some(ImageFormat::Png)
        } else if header.starts_with(JPEG_MAGIC) {
            Some(ImageFormat::Jpeg)
        } else {
            None
        }
    }

    /// Detects the format of a file on disk.
    ///
    /// With `by_content` the first bytes of the file decide; otherwise only
    /// the extension is consulted and the file is not opened.
    pub fn detect(path: &Path, by_content: bool) -> Result<Self> {
        if !by_content {
            return Self::from_extension(path)
                .ok_or_else(|| ConvertError::unsupported_format(path));
        }

        let mut file = File::open(path).map_err(|e| ConvertError::decode_failed(path, e))?;
        let mut header = [0u8; 8];
        let mut filled = 0;
        while filled < header.len() {
            let n = file
                .read(&mut header[filled..])
                .map_err(|e| ConvertError::decode_failed(path, e))?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        Self::sniff(&header[..filled]).ok_or_else(|| ConvertError::unsupported_format(path))
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
