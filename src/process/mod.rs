//! Job orchestration: configuration, scratch files and the pipeline

pub mod config;
pub mod job;
pub mod pipeline;
pub mod scratch;
mod silence;

pub use config::ProcessingConfig;
pub use job::{JobReport, JobRequest, JoinMode, OutputSpec};
pub use pipeline::{Pipeline, Processed};
pub use scratch::{ScratchFile, ScratchSpace};
pub use silence::pad_silence;
