//! Command-line interface.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::audio::PartialFilePolicy;
use crate::config::ConvertConfig;
use crate::synthesis::Quantization;

/// Sample quantization modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum QuantizeArg {
    /// Saturate out-of-range samples at the 16-bit limits
    #[default]
    Clamp,
    /// Truncate and wrap out-of-range samples, as a C int16 cast does (audible distortion)
    Wrap,
}

impl From<QuantizeArg> for Quantization {
    fn from(arg: QuantizeArg) -> Self {
        match arg {
            QuantizeArg::Clamp => Quantization::Clamp,
            QuantizeArg::Wrap => Quantization::Wrap,
        }
    }
}

/// image-spectrogram: convert an image into a WAV file whose spectrogram shows the image
#[derive(Parser, Debug)]
#[command(name = "image-spectrogram")]
#[command(about = "Convert a PNG or JPEG image into a WAV file, one burst of tones per pixel column")]
#[command(version)]
pub struct Cli {
    /// Input image (PNG or JPEG)
    pub input: PathBuf,

    /// Output WAV file path (defaults to the input path with .wav appended)
    pub output: Option<PathBuf>,

    /// Number of threads rendering columns (output is identical for any count)
    #[arg(short = 'j', long, value_parser = clap::value_parser!(u32).range(1..=256))]
    pub threads: Option<u32>,

    /// How out-of-range samples are converted to 16-bit PCM
    #[arg(long, value_enum)]
    pub quantize: Option<QuantizeArg>,

    /// Keep a partially written output file if the conversion fails
    #[arg(long)]
    pub keep_partial: bool,

    /// Detect the input format from file contents instead of the extension
    #[arg(long)]
    pub sniff: bool,

    /// Read the finished WAV back and check its header and length
    #[arg(long)]
    pub verify: bool,

    /// Print a JSON conversion report instead of the output path
    #[arg(long)]
    pub json: bool,

    /// Do not print progress
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Returns the effective output path.
    ///
    /// Defaults to the input path with `.wav` appended (`photo.png` -> `photo.png.wav`).
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let mut path = self.input.clone().into_os_string();
            path.push(".wav");
            PathBuf::from(path)
        })
    }

    /// Applies command-line overrides on top of `config`.
    pub fn apply_to(&self, mut config: ConvertConfig) -> ConvertConfig {
        if let Some(threads) = self.threads {
            config.threads = Some(threads as usize);
        }
        if let Some(quantize) = self.quantize {
            config.quantization = quantize.into();
        }
        if self.keep_partial {
            config.partial_file = PartialFilePolicy::Keep;
        }
        if self.sniff {
            config.detect_by_content = true;
        }
        config
    }

    /// Default log filter for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
