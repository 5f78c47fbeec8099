//! Core types shared by the pipeline and the CLI:
//! - [`ConversionReport`]: totals and fingerprint of a finished conversion
//! - [`PcmFingerprint`]: running hash over written samples

mod report;

pub use report::{samples_to_duration, ConversionReport, PcmFingerprint};
