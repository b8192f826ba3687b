//! Job requests and reports

use crate::codec::OutputFormat;
use crate::loudness::NormalizationReport;
use crate::model::SplicePoint;
use serde::Serialize;
use std::path::PathBuf;

/// How a second recording is attached to the first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum JoinMode {
    /// Hard-cut `A ++ B`
    #[default]
    Concatenate,
    /// Beat-aligned splice with a crossfade
    Splice,
}

/// One output file to produce
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSpec {
    pub path: PathBuf,
    pub format: OutputFormat,
}

/// A single logical job: one recording, or an outgoing/incoming pair
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub job_id: String,
    pub primary: PathBuf,
    pub secondary: Option<PathBuf>,
    pub join_mode: JoinMode,
    pub outputs: Vec<OutputSpec>,
}

impl JobRequest {
    pub fn single(job_id: impl Into<String>, input: PathBuf) -> Self {
        Self {
            job_id: job_id.into(),
            primary: input,
            secondary: None,
            join_mode: JoinMode::default(),
            outputs: Vec::new(),
        }
    }

    pub fn pair(job_id: impl Into<String>, first: PathBuf, second: PathBuf, mode: JoinMode) -> Self {
        Self {
            job_id: job_id.into(),
            primary: first,
            secondary: Some(second),
            join_mode: mode,
            outputs: Vec::new(),
        }
    }

    /// Add an output file
    pub fn with_output(mut self, path: PathBuf, format: OutputFormat) -> Self {
        self.outputs.push(OutputSpec { path, format });
        self
    }
}

/// What a successful job produced
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: String,
    pub outputs: Vec<PathBuf>,
    pub splice_point: Option<SplicePoint>,
    pub initial_lufs: f64,
    pub final_lufs: f64,
    pub first_pass: Option<NormalizationReport>,
    pub second_pass: Option<NormalizationReport>,
    pub silence_frames: usize,
    pub output_frames: usize,
    pub sample_rate: u32,
    pub channels: usize,
    pub warnings: Vec<String>,
}
