//! Integrated loudness measurement (ITU-R BS.1770 / EBU R128)

use crate::error::Result;
use crate::model::Waveform;
use ebur128::{EbuR128, Mode};

/// Integrated loudness of the whole waveform in LUFS
///
/// K-weighting, 400 ms gating blocks, absolute and relative gates and the
/// standard channel weights all come from ebur128. Silent audio (or audio
/// shorter than one gating block) measures as negative infinity.
pub fn integrated_loudness(waveform: &Waveform) -> Result<f64> {
    let mut meter = EbuR128::new(
        waveform.channel_count() as u32,
        waveform.sample_rate(),
        Mode::I,
    )?;
    meter.add_frames_planar_f32(&waveform.planes())?;
    Ok(meter.loudness_global()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(amp: f32, sr: u32, secs: f32) -> Vec<f32> {
        (0..(sr as f32 * secs) as usize)
            .map(|i| amp * (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / sr as f32).sin())
            .collect()
    }

    #[test]
    fn test_silence_is_negative_infinity() {
        let wf = Waveform::mono(vec![0.0; 44100 * 2], 44100).unwrap();
        let l = integrated_loudness(&wf).unwrap();
        assert!(l.is_infinite() && l < 0.0);
    }

    #[test]
    fn test_full_scale_stereo_sine_reference() {
        // 0 dBFS 1 kHz sine in both channels reads 0 LUFS (EBU Tech 3341)
        let tone = sine(1.0, 48000, 3.0);
        let wf = Waveform::new(vec![tone.clone(), tone], 48000).unwrap();
        let l = integrated_loudness(&wf).unwrap();
        assert!((l - 0.0).abs() < 0.5, "measured {:.2}", l);
    }

    #[test]
    fn test_gain_shifts_loudness_linearly() {
        let mut wf = Waveform::mono(sine(0.25, 44100, 3.0), 44100).unwrap();
        let before = integrated_loudness(&wf).unwrap();
        wf.apply_gain(0.5);
        let after = integrated_loudness(&wf).unwrap();
        assert!((before - after - 6.0206).abs() < 0.01);
    }

    #[test]
    fn test_deterministic() {
        let wf = Waveform::mono(sine(0.3, 22050, 2.0), 22050).unwrap();
        assert_eq!(
            integrated_loudness(&wf).unwrap(),
            integrated_loudness(&wf).unwrap()
        );
    }
}
