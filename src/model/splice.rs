//! Splice candidates and beat timelines

use serde::Serialize;
use std::fmt;

/// Candidate seam between the outgoing and incoming recordings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplicePoint {
    /// Cut position in the outgoing recording, seconds
    pub time_a: f64,

    /// Entry position in the incoming recording, seconds
    pub time_b: f64,

    /// Similarity in (0, 1]; higher means a less audible seam
    pub score: f64,
}

impl fmt::Display for SplicePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A@{:.3}s -> B@{:.3}s (score {:.4})",
            self.time_a, self.time_b, self.score
        )
    }
}

/// Beat timestamps of one recording with its tempo estimate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeatTimeline {
    /// Estimated tempo (0.0 when unknown)
    pub bpm: f32,

    /// Beat positions in seconds, non-decreasing
    pub beats: Vec<f64>,
}

impl BeatTimeline {
    /// Build a timeline, sorting and dropping negative or non-finite stamps
    pub fn new(bpm: f32, mut beats: Vec<f64>) -> Self {
        beats.retain(|t| t.is_finite() && *t >= 0.0);
        beats.sort_by(|a, b| a.total_cmp(b));
        Self { bpm, beats }
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    /// Beats strictly later than `start` seconds
    pub fn after(&self, start: f64) -> Vec<f64> {
        self.beats.iter().copied().filter(|&t| t > start).collect()
    }

    /// Beats strictly earlier than `end` seconds
    pub fn before(&self, end: f64) -> Vec<f64> {
        self.beats.iter().copied().filter(|&t| t < end).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_is_sorted_and_cleaned() {
        let tl = BeatTimeline::new(120.0, vec![3.0, -1.0, 1.0, f64::NAN, 2.0]);
        assert_eq!(tl.beats, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_window_restriction_is_strict() {
        let tl = BeatTimeline::new(60.0, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(tl.after(2.0), vec![3.0]);
        assert_eq!(tl.before(1.0), vec![0.0]);
    }
}
