//! Joining two recordings into one waveform

use crate::error::Result;
use crate::model::{ensure_compatible, SplicePoint, Waveform};
use serde::Serialize;
use std::f32::consts::FRAC_PI_2;

/// Gain ramp shape used across the crossfade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CrossfadeCurve {
    /// Gains sum to one at every sample
    #[default]
    Linear,
    /// Squared gains sum to one (constant power for uncorrelated material)
    EqualPower,
}

impl CrossfadeCurve {
    /// (outgoing, incoming) gains at position `t` in [0, 1]
    fn gains(&self, t: f32) -> (f32, f32) {
        match self {
            CrossfadeCurve::Linear => (1.0 - t, t),
            CrossfadeCurve::EqualPower => ((t * FRAC_PI_2).cos(), (t * FRAC_PI_2).sin()),
        }
    }
}

/// Cut A at `point.time_a`, enter B at `point.time_b` and blend the seam
///
/// Output length is `cut_a + (len_b - start_b) - fade`; the fade shrinks to
/// whichever side is shorter.
pub fn crossfade_join(
    a: Waveform,
    b: Waveform,
    point: &SplicePoint,
    crossfade_secs: f64,
    curve: CrossfadeCurve,
) -> Result<Waveform> {
    ensure_compatible(&a, &b)?;
    let sr = a.sample_rate() as f64;

    let cut_a = seconds_to_frame(point.time_a, sr).min(a.frames());
    let start_b = seconds_to_frame(point.time_b, sr).min(b.frames());
    let tail_len = b.frames() - start_b;
    let requested = (crossfade_secs * sr).round() as usize;
    let fade = requested.min(cut_a).min(tail_len);

    if fade < requested {
        log::debug!(
            "Crossfade shortened from {} to {} frames at the seam",
            requested,
            fade
        );
    }

    let channels = a
        .channels()
        .iter()
        .zip(b.channels())
        .map(|(ca, cb)| {
            let head = &ca[..cut_a];
            let tail = &cb[start_b..];
            let mut out = Vec::with_capacity(head.len() + tail.len() - fade);
            out.extend_from_slice(&head[..cut_a - fade]);
            for k in 0..fade {
                let t = (k as f32 + 0.5) / fade as f32;
                let (g_out, g_in) = curve.gains(t);
                out.push(head[cut_a - fade + k] * g_out + tail[k] * g_in);
            }
            out.extend_from_slice(&tail[fade..]);
            out
        })
        .collect();

    log::debug!(
        "Joined at {} with {:.0}ms crossfade",
        point,
        fade as f64 * 1000.0 / sr
    );

    Waveform::new(channels, a.sample_rate())
}

/// Hard-cut concatenation `A ++ B`
pub fn concatenate(mut a: Waveform, b: Waveform) -> Result<Waveform> {
    a.append(b)?;
    Ok(a)
}

fn seconds_to_frame(seconds: f64, sample_rate: f64) -> usize {
    (seconds.max(0.0) * sample_rate).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn point(a: f64, b: f64) -> SplicePoint {
        SplicePoint {
            time_a: a,
            time_b: b,
            score: 1.0,
        }
    }

    #[test]
    fn test_concatenate_is_exact() {
        let a = Waveform::mono(vec![0.1, 0.2, 0.3], 1000).unwrap();
        let b = Waveform::mono(vec![-0.1, -0.2], 1000).unwrap();
        let out = concatenate(a, b).unwrap();
        assert_eq!(out.channel(0), &[0.1, 0.2, 0.3, -0.1, -0.2]);
    }

    #[test]
    fn test_crossfade_length_and_endpoints() {
        let sr = 1000;
        let a = Waveform::mono(vec![1.0; 2000], sr).unwrap();
        let b = Waveform::mono(vec![0.0; 2000], sr).unwrap();

        let out = crossfade_join(a, b, &point(1.5, 0.5), 0.1, CrossfadeCurve::Linear).unwrap();

        // 1500 from A, 1500 from B, 100 overlapped
        assert_eq!(out.frames(), 1500 + 1500 - 100);
        let ch = out.channel(0);
        assert_eq!(ch[1399], 1.0);
        assert!(ch[1400] > 0.99);
        assert!(ch[1499] < 0.01);
        assert_eq!(ch[1500], 0.0);
        // Ramp is monotone
        assert!(ch[1400..1500].windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_linear_crossfade_preserves_constant_level() {
        let sr = 1000;
        let a = Waveform::mono(vec![0.5; 1000], sr).unwrap();
        let b = Waveform::mono(vec![0.5; 1000], sr).unwrap();
        let out = crossfade_join(a, b, &point(0.5, 0.5), 0.1, CrossfadeCurve::Linear).unwrap();
        assert!(out.channel(0).iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_equal_power_gains() {
        let (o, i) = CrossfadeCurve::EqualPower.gains(0.5);
        assert!((o * o + i * i - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fade_shrinks_to_short_side() {
        let sr = 1000;
        let a = Waveform::mono(vec![1.0; 1000], sr).unwrap();
        let b = Waveform::mono(vec![0.0; 1000], sr).unwrap();
        // Only 20 frames remain in B after 0.98s
        let out = crossfade_join(a, b, &point(0.5, 0.98), 0.1, CrossfadeCurve::Linear).unwrap();
        assert_eq!(out.frames(), 500);
    }

    #[test]
    fn test_join_rejects_rate_mismatch() {
        let a = Waveform::mono(vec![0.0; 100], 1000).unwrap();
        let b = Waveform::mono(vec![0.0; 100], 2000).unwrap();
        assert!(matches!(
            crossfade_join(a, b, &point(0.05, 0.0), 0.01, CrossfadeCurve::Linear),
            Err(Error::IncompatibleSources(_))
        ));
    }
}
