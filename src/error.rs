//! Error types for splicing and loudness processing

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for processing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while analyzing, joining or normalizing audio
#[derive(Error, Debug)]
pub enum Error {
    /// Comparison window does not fit inside the buffer
    #[error("Window centered at {center:.3}s spans samples {start}..{end} outside buffer of {len} samples")]
    OutOfRangeWindow {
        center: f64,
        start: i64,
        end: i64,
        len: usize,
    },

    /// No candidate pair survived bounds checking
    #[error("No splice point found between the two recordings")]
    NoSplicePointFound,

    /// Decoder could not make sense of the input
    #[error("Unsupported format or corrupt file {path:?}: {reason}")]
    UnsupportedFormatOrCorruptFile { path: PathBuf, reason: String },

    /// Configuration rejected before any job runs
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Normalizer ran out of iterations (soft; reported as a warning)
    #[error("Loudness did not converge after {iterations} passes: {loudness:.2} LUFS, {residual:+.2} LU from target")]
    NormalizationDidNotConverge {
        iterations: usize,
        loudness: f64,
        residual: f64,
    },

    /// Analysis was given nothing to analyze
    #[error("Empty audio input")]
    EmptyInput,

    /// Waveform construction violated a layout invariant
    #[error("Invalid waveform: {0}")]
    InvalidWaveform(String),

    /// Two sources cannot be joined
    #[error("Incompatible sources: {0}")]
    IncompatibleSources(String),

    /// Beat tracking failed
    #[error("Beat analysis failed: {0}")]
    Analysis(String),

    /// EBU R128 measurement failed
    #[error("Loudness measurement failed: {0}")]
    Loudness(String),

    /// Output could not be written in the requested format
    #[error("Failed to encode {path:?}: {reason}")]
    Encode { path: PathBuf, reason: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ebur128::Error> for Error {
    fn from(err: ebur128::Error) -> Self {
        Self::Loudness(format!("{:?}", err))
    }
}

impl Error {
    /// Whether the error leaves a usable result behind
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Error::OutOfRangeWindow { .. } | Error::NormalizationDidNotConverge { .. }
        )
    }
}

/// Pipeline stage a job was in when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Splice,
    Join,
    Measure,
    Normalize,
    Pad,
    Encode,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::Splice => "splice",
            Stage::Join => "join",
            Stage::Measure => "measure",
            Stage::Normalize => "normalize",
            Stage::Pad => "pad",
            Stage::Encode => "encode",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fatal failure of one job, tagged with where it happened
#[derive(Error, Debug)]
#[error("Job '{job_id}' failed during {stage}: {source}")]
pub struct JobError {
    pub job_id: String,
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl JobError {
    pub fn new(job_id: impl Into<String>, stage: Stage, source: Error) -> Self {
        Self {
            job_id: job_id.into(),
            stage,
            source,
        }
    }
}

/// Attach job context to a stage result
pub(crate) trait StageContext<T> {
    fn stage(self, job_id: &str, stage: Stage) -> std::result::Result<T, JobError>;
}

impl<T> StageContext<T> for Result<T> {
    fn stage(self, job_id: &str, stage: Stage) -> std::result::Result<T, JobError> {
        self.map_err(|e| JobError::new(job_id, stage, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_error_message_names_job_and_stage() {
        let err = JobError::new("show_42", Stage::Splice, Error::NoSplicePointFound);
        let msg = err.to_string();
        assert!(msg.contains("show_42"));
        assert!(msg.contains("splice"));
        assert!(msg.contains("No splice point"));
    }

    #[test]
    fn test_soft_errors() {
        assert!(Error::NormalizationDidNotConverge {
            iterations: 5,
            loudness: -13.5,
            residual: -0.5
        }
        .is_soft());
        assert!(!Error::NoSplicePointFound.is_soft());
        assert!(!Error::InvalidConfig("x".into()).is_soft());
    }

    #[test]
    fn test_stage_context() {
        let r: Result<()> = Err(Error::EmptyInput);
        let err = r.stage("job", Stage::Decode).unwrap_err();
        assert_eq!(err.stage, Stage::Decode);
        assert_eq!(err.job_id, "job");
    }
}
