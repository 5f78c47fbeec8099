//! File-backed WAV output with explicit finish-or-abort.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::wav::{WavStreamWriter, WavSummary};
use crate::error::{ConvertError, Result};

/// What happens to a half-written output file when a conversion fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartialFilePolicy {
    /// Delete the file.
    #[default]
    Remove,
    /// Leave whatever was written on disk.
    Keep,
}

/// Destination for rendered blocks that either completes or is abandoned.
pub trait BlockSink {
    /// Where the blocks end up.
    fn path(&self) -> &Path;

    /// Appends one PCM block after the previous one.
    fn append_block(&mut self, block: &[i16]) -> Result<()>;

    /// Completes the output.
    fn finish(self) -> Result<WavSummary>;

    /// Abandons the output.
    fn abort(self);
}

/// An output WAV file being streamed to disk.
///
/// Call [`finish`](Self::finish) on success or [`abort`](Self::abort) on
/// failure. Dropping an unfinished file applies the partial-file policy.
#[derive(Debug)]
pub struct OutputFile {
    path: PathBuf,
    writer: Option<WavStreamWriter<BufWriter<File>>>,
    policy: PartialFilePolicy,
}

impl OutputFile {
    /// Creates the file and writes the placeholder header.
    pub fn create(path: &Path, policy: PartialFilePolicy) -> Result<Self> {
        let file = File::create(path).map_err(|e| ConvertError::output_open_failed(path, e))?;
        let mut output = Self {
            path: path.to_path_buf(),
            writer: None,
            policy,
        };

        match WavStreamWriter::new(BufWriter::new(file)) {
            Ok(writer) => {
                output.writer = Some(writer);
                debug!(path = %path.display(), "opened output");
                Ok(output)
            }
            Err(e) => {
                output.discard();
                Err(ConvertError::write_failed(e))
            }
        }
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Samples appended so far.
    pub fn samples_written(&self) -> u64 {
        self.writer.as_ref().map_or(0, |w| w.samples_written())
    }

    /// Appends one PCM block.
    pub fn append_block(&mut self, block: &[i16]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ConvertError::write_failed(closed_error()))?;
        writer.append_block(block).map_err(ConvertError::write_failed)
    }

    /// Patches the header sizes and closes the file.
    ///
    /// If patching fails the partial-file policy is applied.
    pub fn finish(mut self) -> Result<WavSummary> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| ConvertError::write_failed(closed_error()))?;

        match writer.finalize() {
            Ok((buffered, summary)) => {
                // finalize flushed; dropping closes the file.
                drop(buffered);
                Ok(summary)
            }
            Err(e) => {
                self.discard();
                Err(ConvertError::write_failed(e))
            }
        }
    }

    /// Abandons the file, applying the partial-file policy.
    pub fn abort(mut self) {
        self.writer.take();
        self.discard();
    }

    fn discard(&mut self) {
        match self.policy {
            PartialFilePolicy::Remove => match fs::remove_file(&self.path) {
                Ok(()) => debug!(path = %self.path.display(), "removed partial output"),
                Err(e) => warn!(path = %self.path.display(), error = %e, "could not remove partial output"),
            },
            PartialFilePolicy::Keep => {
                warn!(path = %self.path.display(), "keeping partial output");
            }
        }
    }
}

impl Drop for OutputFile {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            self.discard();
        }
    }
}

impl BlockSink for OutputFile {
    fn path(&self) -> &Path {
        OutputFile::path(self)
    }

    fn append_block(&mut self, block: &[i16]) -> Result<()> {
        OutputFile::append_block(self, block)
    }

    fn finish(self) -> Result<WavSummary> {
        OutputFile::finish(self)
    }

    fn abort(self) {
        OutputFile::abort(self)
    }
}

fn closed_error() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, "output already closed")
}
