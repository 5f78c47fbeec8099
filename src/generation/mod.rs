//! Conversion module.
//!
//! Provides the image-to-WAV pipeline and the ordered column renderer it
//! drives.

pub mod pipeline;
pub mod queue;

// Re-export commonly used items
pub use pipeline::{
    convert_file, convert_file_with_progress, convert_into, convert_pixels, expected_samples,
    render_to_writer, verify_output,
};
pub use queue::{render_columns, ReleaseWindow, RenderedColumn, ReorderBuffer};
