//! Splice search and crossfade settings

use super::joiner::CrossfadeCurve;
use crate::error::{Error, Result};
use serde::Serialize;

/// How splice candidates are searched for and joined
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpliceConfig {
    /// Seconds at the end of A and start of B searched for beats
    pub search_window: f64,

    /// Half width of each comparison window, seconds
    pub comparison_half_width: f64,

    /// How many ranked candidates to keep
    pub num_candidates: usize,

    /// Crossfade length at the seam, seconds
    pub crossfade: f64,

    /// Gain ramp shape for the crossfade
    pub crossfade_curve: CrossfadeCurve,
}

impl Default for SpliceConfig {
    fn default() -> Self {
        Self {
            search_window: 10.0,
            comparison_half_width: 0.1,
            num_candidates: 5,
            crossfade: 0.1,
            crossfade_curve: CrossfadeCurve::Linear,
        }
    }
}

impl SpliceConfig {
    pub fn with_search_window(mut self, seconds: f64) -> Self {
        self.search_window = seconds;
        self
    }

    pub fn with_num_candidates(mut self, n: usize) -> Self {
        self.num_candidates = n;
        self
    }

    pub fn with_crossfade(mut self, seconds: f64, curve: CrossfadeCurve) -> Self {
        self.crossfade = seconds;
        self.crossfade_curve = curve;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.search_window.is_finite() && self.search_window > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "search window must be positive, got {}",
                self.search_window
            )));
        }
        if !(self.comparison_half_width.is_finite() && self.comparison_half_width > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "comparison half width must be positive, got {}",
                self.comparison_half_width
            )));
        }
        if self.num_candidates == 0 {
            return Err(Error::InvalidConfig("at least one splice candidate required".into()));
        }
        if !(self.crossfade.is_finite() && self.crossfade >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "crossfade must be non-negative, got {}",
                self.crossfade
            )));
        }
        Ok(())
    }
}
