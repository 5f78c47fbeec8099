//! image-spectrogram: convert an image into a WAV file.
//!
//! Prints progress to stderr and the written path (or a JSON report) to
//! stdout. Any failure prints a diagnostic and exits with status 1.

use std::io::Write;

use image_spectrogram::cli::Cli;
use image_spectrogram::config::ConvertConfig;
use image_spectrogram::generation::{convert_file_with_progress, verify_output};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.log_level());

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.apply_to(ConvertConfig::from_env());
    let output = cli.output_path();
    info!(?config, output = %output.display(), "starting conversion");

    let mut progress = Progress::new(!cli.quiet);
    let result = convert_file_with_progress(&cli.input, &output, &config, |done, total| {
        progress.update(done, total)
    });
    progress.finish();
    let report = result?;

    if cli.verify {
        verify_output(&report)?;
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("WAV file written: {}", report.output.display());
    }

    Ok(())
}

/// Percentage counter on stderr, redrawn in place.
struct Progress {
    enabled: bool,
    last: Option<usize>,
}

impl Progress {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last: None,
        }
    }

    fn update(&mut self, done: usize, total: usize) {
        let percent = percent(done, total);
        if !self.enabled || self.last == Some(percent) {
            return;
        }
        self.last = Some(percent);
        eprint!("\r{:3}%", percent);
        let _ = std::io::stderr().flush();
    }

    fn finish(&mut self) {
        if self.enabled && self.last.is_some() {
            eprintln!();
        }
    }
}

fn percent(done: usize, total: usize) -> usize {
    if total == 0 {
        100
    } else {
        100 * done / total
    }
}
