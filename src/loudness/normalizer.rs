//! Damped iterative loudness normalization
//!
//! A fixed-schedule feedback loop: measure, compute the dB error, apply the
//! full correction on the first pass and 80% of it on later passes. The
//! loop is bounded; running out of passes is reported, not raised.

use super::meter::integrated_loudness;
use crate::error::{Error, Result};
use crate::model::Waveform;
use serde::Serialize;

/// Fraction of the correction applied after the first pass
pub const DAMPING: f64 = 0.8;

/// How a normalization run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NormalizationStatus {
    /// Within tolerance of the target
    Converged,
    /// Ran out of passes; result is best effort
    NotConverged,
    /// Loudness could not be measured (silence); waveform untouched
    Unmeasurable,
}

/// Outcome of one normalizer run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationReport {
    /// Loudness before any gain was applied
    pub initial_lufs: f64,
    /// Loudness of the returned waveform
    pub final_lufs: f64,
    /// Gain passes actually applied
    pub passes: usize,
    /// Measurement taken at the start of each iteration, then the final one
    pub history: Vec<f64>,
    pub status: NormalizationStatus,
}

impl NormalizationReport {
    pub fn converged(&self) -> bool {
        self.status == NormalizationStatus::Converged
    }

    /// Soft error describing a missed target, if any
    pub fn warning(&self, target: f64) -> Option<Error> {
        match self.status {
            NormalizationStatus::NotConverged => Some(Error::NormalizationDidNotConverge {
                iterations: self.passes,
                loudness: self.final_lufs,
                residual: self.final_lufs - target,
            }),
            _ => None,
        }
    }
}

/// Drives a waveform toward a target integrated loudness
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessNormalizer {
    target: f64,
    tolerance: f64,
    max_iterations: usize,
}

impl LoudnessNormalizer {
    pub fn new(target: f64, tolerance: f64, max_iterations: usize) -> Self {
        Self {
            target,
            tolerance,
            max_iterations,
        }
    }

    /// Run the bounded loop, scaling `waveform` in place
    pub fn normalize(&self, waveform: &mut Waveform) -> Result<NormalizationReport> {
        let initial = integrated_loudness(waveform)?;
        let mut history = vec![initial];

        if !initial.is_finite() {
            log::warn!("Loudness unmeasurable ({}), skipping normalization", initial);
            return Ok(NormalizationReport {
                initial_lufs: initial,
                final_lufs: initial,
                passes: 0,
                history,
                status: NormalizationStatus::Unmeasurable,
            });
        }

        let mut current = initial;
        let mut passes = 0;
        let mut converged = false;

        for iteration in 0..self.max_iterations {
            if iteration > 0 {
                current = integrated_loudness(waveform)?;
                history.push(current);
            }

            let delta = self.target - current;
            if delta.abs() < self.tolerance {
                log::debug!("Target reached at iteration {}", iteration + 1);
                converged = true;
                break;
            }

            let damping = if iteration == 0 { 1.0 } else { DAMPING };
            let gain_db = delta * damping;
            waveform.apply_gain(10f64.powf(gain_db / 20.0) as f32);
            passes += 1;

            log::debug!(
                "Iteration {}: {:.2} LUFS, applied {:+.2} dB",
                iteration + 1,
                current,
                gain_db
            );
        }

        if !converged {
            current = integrated_loudness(waveform)?;
            history.push(current);
            converged = (self.target - current).abs() < self.tolerance;
        }

        let status = if converged {
            NormalizationStatus::Converged
        } else {
            NormalizationStatus::NotConverged
        };

        Ok(NormalizationReport {
            initial_lufs: initial,
            final_lufs: current,
            passes,
            history,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(amp: f32, secs: f32) -> Waveform {
        let sr = 44100;
        let samples = (0..(sr as f32 * secs) as usize)
            .map(|i| amp * (2.0 * std::f32::consts::PI * 997.0 * i as f32 / sr as f32).sin())
            .collect();
        Waveform::mono(samples, sr).unwrap()
    }

    #[test]
    fn test_reaches_target() {
        let mut wf = tone(0.05, 3.0);
        let report = LoudnessNormalizer::new(-14.0, 0.1, 5)
            .normalize(&mut wf)
            .unwrap();

        assert!(report.converged());
        assert!((report.final_lufs + 14.0).abs() < 0.1);
        assert!(report.passes >= 1);
        assert!((integrated_loudness(&wf).unwrap() + 14.0).abs() < 0.1);
    }

    #[test]
    fn test_near_target_is_untouched() {
        let mut wf = tone(0.1, 3.0);
        let current = integrated_loudness(&wf).unwrap();
        let original = wf.clone();

        let report = LoudnessNormalizer::new(current + 0.05, 0.1, 5)
            .normalize(&mut wf)
            .unwrap();

        assert_eq!(report.passes, 0);
        assert!(report.converged());
        assert_eq!(wf, original);
    }

    #[test]
    fn test_exhausted_iterations_are_soft() {
        let mut wf = tone(0.01, 3.0);
        // A tolerance nobody can meet with f32 samples
        let report = LoudnessNormalizer::new(-14.0, 1e-12, 2)
            .normalize(&mut wf)
            .unwrap();

        assert_eq!(report.passes, 2);
        assert_eq!(report.status, NormalizationStatus::NotConverged);
        assert!(matches!(
            report.warning(-14.0),
            Some(Error::NormalizationDidNotConverge { iterations: 2, .. })
        ));
        // Still driven close to the target
        assert!((report.final_lufs + 14.0).abs() < 0.1);
    }

    #[test]
    fn test_silence_is_unmeasurable() {
        let mut wf = Waveform::mono(vec![0.0; 44100], 44100).unwrap();
        let report = LoudnessNormalizer::new(-14.0, 0.1, 5)
            .normalize(&mut wf)
            .unwrap();
        assert_eq!(report.status, NormalizationStatus::Unmeasurable);
        assert_eq!(report.passes, 0);
        assert!(wf.channel(0).iter().all(|&s| s == 0.0));
    }
}
