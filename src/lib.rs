//! image-spectrogram: turn a picture into sound.
//!
//! Every pixel column of an image becomes 0.2 seconds of audio. Within a
//! column each sufficiently bright pixel contributes one sine tone: its row
//! sets the pitch (top row near 22kHz, bottom row near 0Hz) and its
//! brightness sets the loudness. The columns are written left to right into
//! a 44.1kHz mono 16-bit WAV file, so a spectrogram of the output shows the
//! image.
//!
//! # Modules
//!
//! - [`raster`]: PNG/JPEG decoding to an RGB [`PixelBuffer`]
//! - [`synthesis`]: tone extraction and additive block rendering
//! - [`audio`]: streaming WAV writer and output file handling
//! - [`generation`]: the conversion pipeline
//! - [`config`]: runtime configuration ([`ConvertConfig`])
//! - [`error`]: error types and codes ([`ConvertError`], [`ErrorCode`])
//!
//! # Example
//!
//! ```rust,ignore
//! use image_spectrogram::{convert_file, ConvertConfig};
//!
//! let config = ConvertConfig {
//!     threads: Some(4),
//!     ..Default::default()
//! };
//! let report = convert_file("sunset.png".as_ref(), "sunset.png.wav".as_ref(), &config)?;
//! println!("{} seconds of audio", report.duration_sec);
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod raster;
pub mod synthesis;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use config::ConvertConfig;
pub use error::{ConvertError, ErrorCode, Result};
pub use generation::{convert_file, convert_file_with_progress, convert_pixels, verify_output};
pub use raster::PixelBuffer;
pub use synthesis::Quantization;
pub use types::ConversionReport;
