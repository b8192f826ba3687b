//! Splice Normalizer - loudness-normalized delivery files from raw recordings
//!
//! This library joins a recording with an optional second part (hard cut or
//! beat-aligned crossfade), normalizes the result to a target integrated
//! loudness, pads it with trailing silence and writes WAV/MP3 deliverables.

pub mod analysis;
pub mod batch;
pub mod codec;
pub mod error;
pub mod loudness;
pub mod model;
pub mod process;
pub mod splice;
pub mod validation;

pub use error::{Error, JobError, Result, Stage};
pub use process::config::ProcessingConfig;
pub use process::pipeline::Pipeline;
