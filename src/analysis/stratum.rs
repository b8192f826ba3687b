//! Beat tracking using stratum-dsp
//!
//! The waveform is mixed down to mono and handed to stratum-dsp's
//! onset/tempogram analysis, whose HMM beat grid becomes the timeline.

use super::traits::BeatTracker;
use crate::error::{Error, Result};
use crate::model::{BeatTimeline, Waveform};
use stratum_dsp::{analyze_audio, AnalysisConfig};

/// Beat tracker backed by stratum-dsp
#[derive(Debug, Clone)]
pub struct StratumBeatTracker {
    /// Minimum BPM for tempo folding
    min_bpm: f32,
    /// Maximum BPM for tempo folding
    max_bpm: f32,
}

impl StratumBeatTracker {
    pub fn new() -> Self {
        Self {
            min_bpm: 70.0,
            max_bpm: 170.0,
        }
    }

    /// Create tracker with custom BPM range
    pub fn with_bpm_range(mut self, min: f32, max: f32) -> Self {
        self.min_bpm = min;
        self.max_bpm = max;
        self
    }
}

impl Default for StratumBeatTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BeatTracker for StratumBeatTracker {
    fn track(&self, waveform: &Waveform) -> Result<BeatTimeline> {
        if waveform.is_empty() {
            return Err(Error::EmptyInput);
        }

        let samples = waveform.mix_to_mono();
        let sample_rate = waveform.sample_rate();

        if samples.len() < sample_rate as usize {
            return Err(Error::Analysis("audio too short for beat tracking".into()));
        }

        let config = AnalysisConfig::default();
        let result = analyze_audio(&samples, sample_rate, config)
            .map_err(|e| Error::Analysis(format!("{:?}", e)))?;

        drop(samples);

        let bpm = fold_bpm(result.bpm, self.min_bpm, self.max_bpm);
        let beats: Vec<f64> = result
            .beat_grid
            .beats
            .iter()
            .map(|&t| t as f64)
            .collect();

        log::debug!(
            "Beat tracking complete: BPM={:.1}, {} beats over {:.1}s",
            bpm,
            beats.len(),
            waveform.duration_secs()
        );

        Ok(BeatTimeline::new(bpm, beats))
    }
}

/// Double or halve a tempo estimate until it sits in `[min_bpm, max_bpm]`
pub(crate) fn fold_bpm(mut bpm: f32, min_bpm: f32, max_bpm: f32) -> f32 {
    if min_bpm > 0.0 && max_bpm > 0.0 && bpm > 0.0 {
        while bpm < min_bpm && bpm * 2.0 <= max_bpm {
            bpm *= 2.0;
            log::debug!("BPM doubled to {:.1} (was below minimum {})", bpm, min_bpm);
        }
        while bpm > max_bpm && bpm / 2.0 >= min_bpm {
            bpm /= 2.0;
            log::debug!("BPM halved to {:.1} (was above maximum {})", bpm, max_bpm);
        }
    }
    bpm
}
