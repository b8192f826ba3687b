//! Processing configuration

use crate::codec::{lame_bitrate, WavEncoding};
use crate::error::{Error, Result};
use crate::splice::SpliceConfig;
use serde::Serialize;
use std::path::PathBuf;

/// Configuration for a processing run, shared read-only by every job
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingConfig {
    /// Target integrated loudness in LUFS
    pub target_loudness: f64,

    /// Acceptable deviation from the target, LU
    pub tolerance: f64,

    /// Seconds of digital silence appended to the output
    pub silence_duration: f64,

    /// Upper bound on normalizer gain passes
    pub max_normalization_iterations: usize,

    /// Deviation (LU) above which the pipeline runs the normalizer at all
    pub strict_gate: f64,

    /// Splice search and crossfade settings
    pub splice: SpliceConfig,

    /// Clamp samples to full scale after normalization
    pub peak_limit: bool,

    /// Directory for intermediate joined files
    pub scratch_dir: PathBuf,

    /// Sample encoding of WAV outputs
    pub wav_encoding: WavEncoding,

    /// Bitrate of MP3 delivery files
    pub mp3_bitrate_kbps: u32,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            target_loudness: -14.0,
            tolerance: 0.1,
            silence_duration: 2.0,
            max_normalization_iterations: 5,
            strict_gate: 0.05,
            splice: SpliceConfig::default(),
            peak_limit: false,
            scratch_dir: std::env::temp_dir(),
            wav_encoding: WavEncoding::default(),
            mp3_bitrate_kbps: 320,
        }
    }
}

impl ProcessingConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set target loudness and tolerance
    pub fn with_target(mut self, target_loudness: f64, tolerance: f64) -> Self {
        self.target_loudness = target_loudness;
        self.tolerance = tolerance;
        self
    }

    pub fn with_silence_duration(mut self, seconds: f64) -> Self {
        self.silence_duration = seconds;
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_normalization_iterations = iterations;
        self
    }

    pub fn with_splice(mut self, splice: SpliceConfig) -> Self {
        self.splice = splice;
        self
    }

    pub fn with_peak_limit(mut self, enable: bool) -> Self {
        self.peak_limit = enable;
        self
    }

    pub fn with_scratch_dir(mut self, dir: PathBuf) -> Self {
        self.scratch_dir = dir;
        self
    }

    pub fn with_outputs(mut self, wav_encoding: WavEncoding, mp3_bitrate_kbps: u32) -> Self {
        self.wav_encoding = wav_encoding;
        self.mp3_bitrate_kbps = mp3_bitrate_kbps;
        self
    }

    /// Reject settings no job could run with
    pub fn validate(&self) -> Result<()> {
        if !self.target_loudness.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "target loudness must be finite, got {}",
                self.target_loudness
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !(self.silence_duration.is_finite() && self.silence_duration > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "silence duration must be positive, got {}",
                self.silence_duration
            )));
        }
        if self.max_normalization_iterations == 0 {
            return Err(Error::InvalidConfig(
                "at least one normalization iteration required".into(),
            ));
        }
        if !(self.strict_gate.is_finite() && self.strict_gate >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "strict gate must be non-negative, got {}",
                self.strict_gate
            )));
        }
        if lame_bitrate(self.mp3_bitrate_kbps).is_none() {
            return Err(Error::InvalidConfig(format!(
                "unsupported MP3 bitrate {} kbps",
                self.mp3_bitrate_kbps
            )));
        }
        self.splice.validate()
    }
}
