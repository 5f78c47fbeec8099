//! Audio output module.
//!
//! Provides streaming WAV writing for rendered column blocks.

pub mod output;
pub mod wav;

// Re-export commonly used items
pub use output::{BlockSink, OutputFile, PartialFilePolicy};
pub use wav::{
    data_size_for_columns, inspect_wav, WavHeader, WavInfo, WavStreamWriter, WavSummary,
    BITS_PER_SAMPLE, CHANNELS, HEADER_LEN,
};
