//! Fixed beat tracker
//!
//! Skips detection and reports either explicit timestamps or a uniform
//! grid. Useful when the tempo is already known.

use super::traits::BeatTracker;
use crate::error::{Error, Result};
use crate::model::{BeatTimeline, Waveform};

#[derive(Debug, Clone)]
enum Beats {
    Explicit(Vec<f64>),
    Grid { bpm: f32, offset: f64 },
}

/// Beat tracker that reports predetermined beats
#[derive(Debug, Clone)]
pub struct FixedBeatTracker {
    beats: Beats,
}

impl FixedBeatTracker {
    /// Report exactly these timestamps (those past the end are dropped)
    pub fn from_timestamps(beats: Vec<f64>) -> Self {
        Self {
            beats: Beats::Explicit(beats),
        }
    }

    /// Report a beat every `60 / bpm` seconds starting at `offset`
    pub fn grid(bpm: f32, offset: f64) -> Result<Self> {
        if !(bpm.is_finite() && bpm > 0.0) {
            return Err(Error::InvalidConfig(format!("grid BPM must be positive, got {}", bpm)));
        }
        if !(offset.is_finite() && offset >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "grid offset must be non-negative, got {}",
                offset
            )));
        }
        Ok(Self {
            beats: Beats::Grid { bpm, offset },
        })
    }
}

impl BeatTracker for FixedBeatTracker {
    fn track(&self, waveform: &Waveform) -> Result<BeatTimeline> {
        if waveform.is_empty() {
            return Err(Error::EmptyInput);
        }
        let duration = waveform.duration_secs();

        let timeline = match &self.beats {
            Beats::Explicit(beats) => BeatTimeline::new(
                0.0,
                beats.iter().copied().filter(|&t| t <= duration).collect(),
            ),
            Beats::Grid { bpm, offset } => {
                let period = 60.0 / *bpm as f64;
                let beats = (0..)
                    .map(|k| offset + k as f64 * period)
                    .take_while(|&t| t < duration)
                    .collect();
                BeatTimeline::new(*bpm, beats)
            }
        };

        log::debug!("Fixed beat timeline: {} beats", timeline.len());
        Ok(timeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_covers_duration() {
        let wf = Waveform::mono(vec![0.0; 8000 * 4], 8000).unwrap();
        let tracker = FixedBeatTracker::grid(120.0, 0.25).unwrap();
        let tl = tracker.track(&wf).unwrap();
        assert_eq!(tl.beats, vec![0.25, 0.75, 1.25, 1.75, 2.25, 2.75, 3.25, 3.75]);
        assert_eq!(tl.bpm, 120.0);
    }

    #[test]
    fn test_explicit_drops_beats_past_end() {
        let wf = Waveform::mono(vec![0.0; 8000], 8000).unwrap();
        let tracker = FixedBeatTracker::from_timestamps(vec![0.5, 2.0]);
        assert_eq!(tracker.track(&wf).unwrap().beats, vec![0.5]);
    }

    #[test]
    fn test_grid_rejects_bad_bpm() {
        assert!(FixedBeatTracker::grid(0.0, 0.0).is_err());
        assert!(FixedBeatTracker::grid(120.0, -1.0).is_err());
    }
}
