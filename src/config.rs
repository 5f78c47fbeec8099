//! Conversion configuration module.
//!
//! Sample rate and column duration are fixed; what can be configured is how
//! the work is scheduled, how samples are quantized, and what happens to
//! output after a failure.

use serde::{Deserialize, Serialize};

use crate::audio::PartialFilePolicy;
use crate::error::{ConvertError, Result};
use crate::synthesis::Quantization;

/// Upper bound on rendering threads.
pub const MAX_THREADS: usize = 256;

/// Runtime configuration for a conversion.
///
/// Built from environment variables, then overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConvertConfig {
    /// Number of threads rendering columns.
    /// If None, columns are rendered on the calling thread.
    pub threads: Option<usize>,

    /// Conversion of sample values to 16-bit PCM.
    pub quantization: Quantization,

    /// Handling of the output file when a conversion fails.
    pub partial_file: PartialFilePolicy,

    /// Choose the decoder from the file's magic bytes instead of its extension.
    pub detect_by_content: bool,
}

impl ConvertConfig {
    /// Creates a new ConvertConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ConvertConfig from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `IMGSPEC_THREADS` - Rendering threads (1-256)
    /// - `IMGSPEC_QUANTIZE` - Quantization mode (clamp, wrap)
    /// - `IMGSPEC_KEEP_PARTIAL` - Keep partial output on failure (1/true)
    /// - `IMGSPEC_SNIFF` - Detect input format by content (1/true)
    ///
    /// Falls back to defaults for unset or invalid variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(threads_str) = lookup("IMGSPEC_THREADS") {
            if let Ok(threads) = threads_str.trim().parse::<usize>() {
                if (1..=MAX_THREADS).contains(&threads) {
                    config.threads = Some(threads);
                }
            }
        }

        if let Some(mode) = lookup("IMGSPEC_QUANTIZE") {
            if let Some(quantization) = Quantization::parse(mode.trim()) {
                config.quantization = quantization;
            }
        }

        if let Some(flag) = lookup("IMGSPEC_KEEP_PARTIAL") {
            if parse_flag(&flag) {
                config.partial_file = PartialFilePolicy::Keep;
            }
        }

        if let Some(flag) = lookup("IMGSPEC_SNIFF") {
            config.detect_by_content = parse_flag(&flag);
        }

        config
    }

    /// Number of rendering threads to use; 1 means sequential.
    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or(1)
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if let Some(threads) = self.threads {
            if threads == 0 {
                return Some("threads must be > 0".to_string());
            }
            if threads > MAX_THREADS {
                return Some(format!("threads too high: {} (max {})", threads, MAX_THREADS));
            }
        }

        None
    }

    /// Like [`validate`](Self::validate), as a `Result`.
    pub fn ensure_valid(&self) -> Result<()> {
        match self.validate() {
            Some(reason) => Err(ConvertError::invalid_config(reason)),
            None => Ok(()),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
