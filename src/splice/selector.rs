//! Splice point selection
//!
//! Pairs every trailing beat of the outgoing recording with every leading
//! beat of the incoming one and scores how alike the two ±half-width
//! windows sound. Window features are computed once per beat; pair scores
//! land in a flat `i * |B| + j` buffer and only the top-k survivors are
//! sorted.

use super::config::SpliceConfig;
use crate::analysis::{BeatTracker, Stft, WindowFeatures};
use crate::error::{Error, Result};
use crate::model::{SplicePoint, Waveform};
use rayon::prelude::*;
use std::cmp::Ordering;

/// Beat-tracked, scored splice search between two recordings
pub fn find_splice_points<T: BeatTracker + ?Sized>(
    a: &Waveform,
    b: &Waveform,
    tracker: &T,
    config: &SpliceConfig,
) -> Result<Vec<SplicePoint>> {
    let timeline_a = tracker.track(a)?;
    let timeline_b = tracker.track(b)?;

    let tail_beats = timeline_a.after(a.duration_secs() - config.search_window);
    let head_beats = timeline_b.before(config.search_window);

    log::debug!(
        "Beats in search window: {} of {} (A tail), {} of {} (B head)",
        tail_beats.len(),
        timeline_a.len(),
        head_beats.len(),
        timeline_b.len()
    );

    rank_candidates(
        &a.mix_to_mono(),
        a.sample_rate(),
        &tail_beats,
        &b.mix_to_mono(),
        b.sample_rate(),
        &head_beats,
        config,
    )
}

/// Score every `(beat_a, beat_b)` pair and return the best candidates
///
/// Pairs whose comparison window leaves either buffer are skipped. The
/// result is sorted by non-increasing score, ties broken by beat order.
pub fn rank_candidates(
    samples_a: &[f32],
    rate_a: u32,
    beats_a: &[f64],
    samples_b: &[f32],
    rate_b: u32,
    beats_b: &[f64],
    config: &SpliceConfig,
) -> Result<Vec<SplicePoint>> {
    if samples_a.is_empty() || samples_b.is_empty() {
        return Err(Error::EmptyInput);
    }

    let stft = Stft::default();
    let half = config.comparison_half_width;

    let features_a = window_features(samples_a, rate_a, beats_a, half, &stft)?;
    let features_b = window_features(samples_b, rate_b, beats_b, half, &stft)?;

    let width = features_b.len();
    let mut scores = vec![f64::NAN; features_a.len() * width];
    scores.par_iter_mut().enumerate().for_each(|(idx, slot)| {
        if let (Some(fa), Some(fb)) = (&features_a[idx / width], &features_b[idx % width]) {
            *slot = fa.similarity(fb);
        }
    });

    let mut ranked: Vec<usize> = (0..scores.len()).filter(|&k| !scores[k].is_nan()).collect();
    log::debug!(
        "Scored {} of {} beat pairs ({} out of range)",
        ranked.len(),
        scores.len(),
        scores.len() - ranked.len()
    );

    let by_score = |x: &usize, y: &usize| -> Ordering {
        scores[*y].total_cmp(&scores[*x]).then(x.cmp(y))
    };
    let k = config.num_candidates;
    if ranked.len() > k {
        if k == 0 {
            ranked.clear();
        } else {
            ranked.select_nth_unstable_by(k - 1, by_score);
            ranked.truncate(k);
        }
    }
    ranked.sort_unstable_by(by_score);

    Ok(ranked
        .into_iter()
        .map(|idx| SplicePoint {
            time_a: beats_a[idx / width],
            time_b: beats_b[idx % width],
            score: scores[idx],
        })
        .collect())
}

/// Features for each beat, `None` where the window is out of range
fn window_features(
    samples: &[f32],
    sample_rate: u32,
    beats: &[f64],
    half_width: f64,
    stft: &Stft,
) -> Result<Vec<Option<WindowFeatures>>> {
    beats
        .par_iter()
        .map(
            |&t| match WindowFeatures::extract(samples, sample_rate, t, half_width, stft) {
                Ok(f) => Ok(Some(f)),
                Err(Error::OutOfRangeWindow { .. }) => Ok(None),
                Err(e) => Err(e),
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, amp: f32, sr: u32, secs: f32) -> Vec<f32> {
        (0..(sr as f32 * secs) as usize)
            .map(|i| amp * (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect()
    }

    #[test]
    fn test_ranked_descending_and_truncated() {
        let sr = 8000;
        // Amplitude ramps up so every beat sounds different
        let a: Vec<f32> = (0..sr * 4)
            .map(|i| (i as f32 / (sr * 4) as f32) * (i as f32 * 0.3).sin())
            .collect();
        let b = a.clone();
        let beats: Vec<f64> = (1..8).map(|k| k as f64 * 0.5).collect();
        let config = SpliceConfig::default().with_num_candidates(3);

        let out = rank_candidates(&a, sr as u32, &beats, &b, sr as u32, &beats, &config).unwrap();

        assert_eq!(out.len(), 3);
        assert!(out.windows(2).all(|w| w[0].score >= w[1].score));
        // Identical material at identical beats wins
        assert_eq!(out[0].time_a, out[0].time_b);
        assert_eq!(out[0].score, 1.0);
    }

    #[test]
    fn test_out_of_range_pairs_are_skipped() {
        let sr = 8000u32;
        let a = sine(440.0, 0.5, sr, 1.0);
        let b = sine(440.0, 0.5, sr, 1.0);
        // 0.05s and 0.98s both fall within 0.1s of an edge
        let beats = vec![0.05, 0.5, 0.98];
        let config = SpliceConfig::default();

        let out = rank_candidates(&a, sr, &beats, &b, sr, &beats, &config).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].time_a, 0.5);
        assert_eq!(out[0].time_b, 0.5);
    }

    #[test]
    fn test_zero_candidates_requested() {
        let sr = 8000u32;
        let a = sine(440.0, 0.5, sr, 1.0);
        let config = SpliceConfig::default().with_num_candidates(0);
        let out = rank_candidates(&a, sr, &[0.5], &a, sr, &[0.5], &config).unwrap();
        assert!(out.is_empty());
    }
}
