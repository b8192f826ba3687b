//! Trailing silence padding

use crate::error::{Error, Result};
use crate::model::Waveform;

/// Append `round(duration × sample_rate)` zero frames to every channel
///
/// Returns the number of frames added.
pub fn pad_silence(waveform: &mut Waveform, duration_secs: f64) -> Result<usize> {
    if !(duration_secs.is_finite() && duration_secs > 0.0) {
        return Err(Error::InvalidConfig(format!(
            "silence duration must be positive, got {}",
            duration_secs
        )));
    }
    let frames = (duration_secs * waveform.sample_rate() as f64).round() as usize;
    waveform.extend_with_silence(frames);
    log::debug!("Appended {} frames ({:.2}s) of silence", frames, duration_secs);
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pads_every_channel() {
        let mut wf = Waveform::new(vec![vec![0.5; 100], vec![-0.5; 100]], 1000).unwrap();
        let added = pad_silence(&mut wf, 0.25).unwrap();

        assert_eq!(added, 250);
        assert_eq!(wf.channel_count(), 2);
        assert_eq!(wf.frames(), 350);
        for ch in wf.channels() {
            assert!(ch[100..].iter().all(|&s| s == 0.0));
            assert!(ch[..100].iter().all(|&s| s != 0.0));
        }
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        let mut wf = Waveform::mono(vec![0.1; 10], 1000).unwrap();
        assert!(pad_silence(&mut wf, 0.0).is_err());
        assert!(pad_silence(&mut wf, -2.0).is_err());
        assert_eq!(wf.frames(), 10);
    }
}
