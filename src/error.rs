//! Error types for image-to-audio conversion.
//!
//! Every failure of a conversion is terminal: there are no retries and no
//! partial-success mode. Codes are stable strings so scripts can match on
//! them.

use std::fmt;
use std::path::Path;

/// Error codes for conversion failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Input is neither PNG nor JPEG.
    /// Trigger: unknown file extension, or unrecognised magic bytes when sniffing.
    UnsupportedFormat,

    /// Image could not be read or decoded.
    /// Trigger: missing file, corrupt data, truncated stream.
    DecodeFailed,

    /// Decoded image cannot be converted.
    /// Trigger: zero width or height, pixel buffer of the wrong length.
    InvalidImage,

    /// Resulting WAV would not fit the 32-bit RIFF size fields.
    /// Trigger: extremely wide image.
    OutputTooLarge,

    /// Output file could not be created.
    /// Trigger: missing directory, permissions.
    OutputOpenFailed,

    /// I/O failure while streaming samples or patching the header.
    /// Trigger: disk full, device removed.
    WriteFailed,

    /// Configuration value out of range.
    InvalidConfig,

    /// Finished WAV file did not read back as written.
    VerificationFailed,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            ErrorCode::DecodeFailed => "DECODE_FAILED",
            ErrorCode::InvalidImage => "INVALID_IMAGE",
            ErrorCode::OutputTooLarge => "OUTPUT_TOO_LARGE",
            ErrorCode::OutputOpenFailed => "OUTPUT_OPEN_FAILED",
            ErrorCode::WriteFailed => "WRITE_FAILED",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::VerificationFailed => "VERIFICATION_FAILED",
        }
    }

    /// Returns a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::UnsupportedFormat => "Unsupported image format (PNG and JPEG only)",
            ErrorCode::DecodeFailed => "Failed to read image",
            ErrorCode::InvalidImage => "Image has no pixels or an inconsistent buffer",
            ErrorCode::OutputTooLarge => "Output exceeds the 4 GiB WAV size limit",
            ErrorCode::OutputOpenFailed => "Failed to create output file",
            ErrorCode::WriteFailed => "Failed to write WAV data",
            ErrorCode::InvalidConfig => "Invalid configuration value",
            ErrorCode::VerificationFailed => "Written WAV file does not match the conversion",
        }
    }

    /// Returns a recovery hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::UnsupportedFormat => {
                "Convert the image to PNG or JPEG, or pass --sniff if the extension is wrong"
            }
            ErrorCode::DecodeFailed => "Check that the file exists and is a valid image",
            ErrorCode::InvalidImage => "Use an image with at least one pixel",
            ErrorCode::OutputTooLarge => {
                "Each column adds 0.2s of audio; scale the image down to fewer columns"
            }
            ErrorCode::OutputOpenFailed => {
                "Check that the output directory exists and is writable"
            }
            ErrorCode::WriteFailed => "Check free disk space and try again",
            ErrorCode::InvalidConfig => "Threads must be between 1 and 256",
            ErrorCode::VerificationFailed => {
                "Re-run the conversion; if it persists the output device may be faulty"
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for conversion operations.
#[derive(Debug)]
pub struct ConvertError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message with context.
    pub message: String,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ConvertError {
    /// Creates a new ConvertError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new ConvertError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an UNSUPPORTED_FORMAT error.
    pub fn unsupported_format(path: &Path) -> Self {
        Self::new(
            ErrorCode::UnsupportedFormat,
            format!("Unsupported image format: {}", path.display()),
        )
    }

    /// Creates a DECODE_FAILED error.
    pub fn decode_failed(
        path: &Path,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::with_source(
            ErrorCode::DecodeFailed,
            format!("Failed to read image {}: {}", path.display(), source),
            source,
        )
    }

    /// Creates an INVALID_IMAGE error.
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidImage, reason)
    }

    /// Creates an OUTPUT_TOO_LARGE error.
    pub fn output_too_large(columns: usize) -> Self {
        Self::new(
            ErrorCode::OutputTooLarge,
            format!("{} columns of audio do not fit in a WAV file", columns),
        )
    }

    /// Creates an OUTPUT_OPEN_FAILED error.
    pub fn output_open_failed(path: &Path, source: std::io::Error) -> Self {
        Self::with_source(
            ErrorCode::OutputOpenFailed,
            format!("Cannot create {}: {}", path.display(), source),
            source,
        )
    }

    /// Creates a WRITE_FAILED error.
    pub fn write_failed(source: std::io::Error) -> Self {
        Self::with_source(
            ErrorCode::WriteFailed,
            format!("Write failed: {}", source),
            source,
        )
    }

    /// Creates an INVALID_CONFIG error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, reason)
    }

    /// Creates a VERIFICATION_FAILED error.
    pub fn verification_failed(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::VerificationFailed, reason)
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}. Recovery: {}",
            self.code,
            self.message,
            self.code.recovery_hint()
        )
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for ConvertError {
    fn from(err: std::io::Error) -> Self {
        Self::write_failed(err)
    }
}

/// Result type alias using ConvertError.
pub type Result<T> = std::result::Result<T, ConvertError>;
