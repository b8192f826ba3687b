//! Planar audio buffer and layout helpers

use crate::error::{Error, Result};

/// Planar multi-channel audio buffer
///
/// Every channel holds the same number of frames and the sample rate is
/// fixed for the lifetime of the buffer. Mono audio is a single channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl Waveform {
    /// Build a waveform from per-channel sample vectors
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidWaveform("sample rate must be positive".into()));
        }
        let Some(first) = channels.first() else {
            return Err(Error::InvalidWaveform("at least one channel required".into()));
        };
        let frames = first.len();
        if let Some((idx, ch)) = channels.iter().enumerate().find(|(_, c)| c.len() != frames) {
            return Err(Error::InvalidWaveform(format!(
                "channel {} has {} samples, expected {}",
                idx,
                ch.len(),
                frames
            )));
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Single-channel waveform
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    /// Split interleaved samples (L R L R ...) into planar channels
    pub fn from_interleaved(samples: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(Error::InvalidWaveform("at least one channel required".into()));
        }
        if samples.len() % channels != 0 {
            return Err(Error::InvalidWaveform(format!(
                "{} interleaved samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }
        let frames = samples.len() / channels;
        let mut planar = vec![Vec::with_capacity(frames); channels];
        for frame in samples.chunks_exact(channels) {
            for (ch, &s) in planar.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        Self::new(planar, sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel
    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn channel(&self, idx: usize) -> &[f32] {
        &self.channels[idx]
    }

    /// Planar view suitable for per-channel consumers
    pub fn planes(&self) -> Vec<&[f32]> {
        self.channels.iter().map(Vec::as_slice).collect()
    }

    /// Interleaved copy (L R L R ...)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let n = self.channel_count();
        let mut out = Vec::with_capacity(self.frames() * n);
        for i in 0..self.frames() {
            for ch in &self.channels {
                out.push(ch[i]);
            }
        }
        out
    }

    /// Average of all channels
    pub fn mix_to_mono(&self) -> Vec<f32> {
        if self.channel_count() == 1 {
            return self.channels[0].clone();
        }
        let scale = 1.0 / self.channel_count() as f32;
        (0..self.frames())
            .map(|i| self.channels.iter().map(|ch| ch[i]).sum::<f32>() * scale)
            .collect()
    }

    /// Multiply every sample of every channel by `gain`
    pub fn apply_gain(&mut self, gain: f32) {
        for ch in &mut self.channels {
            for s in ch.iter_mut() {
                *s *= gain;
            }
        }
    }

    /// Clamp every sample into [-1.0, 1.0]
    pub fn clamp_to_full_scale(&mut self) -> usize {
        let mut clamped = 0;
        for ch in &mut self.channels {
            for s in ch.iter_mut() {
                if s.abs() > 1.0 {
                    *s = s.clamp(-1.0, 1.0);
                    clamped += 1;
                }
            }
        }
        clamped
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Append `frames` zero samples to every channel
    pub fn extend_with_silence(&mut self, frames: usize) {
        for ch in &mut self.channels {
            ch.resize(ch.len() + frames, 0.0);
        }
    }

    /// Duplicate a mono waveform onto `channels` channels
    pub fn upmix(self, channels: usize) -> Result<Waveform> {
        if self.channel_count() == channels {
            return Ok(self);
        }
        if self.channel_count() != 1 || channels == 0 {
            return Err(Error::IncompatibleSources(format!(
                "cannot map {} channels onto {}",
                self.channel_count(),
                channels
            )));
        }
        let mono = self.channels.into_iter().next().unwrap_or_default();
        Waveform::new(vec![mono; channels], self.sample_rate)
    }

    /// Append another waveform with the same layout
    pub fn append(&mut self, other: Waveform) -> Result<()> {
        ensure_compatible(self, &other)?;
        for (dst, src) in self.channels.iter_mut().zip(other.channels) {
            dst.extend(src);
        }
        Ok(())
    }
}

/// Check two waveforms share sample rate and channel layout
pub fn ensure_compatible(a: &Waveform, b: &Waveform) -> Result<()> {
    if a.sample_rate != b.sample_rate {
        return Err(Error::IncompatibleSources(format!(
            "sample rates differ ({} Hz vs {} Hz)",
            a.sample_rate, b.sample_rate
        )));
    }
    if a.channel_count() != b.channel_count() {
        return Err(Error::IncompatibleSources(format!(
            "channel counts differ ({} vs {})",
            a.channel_count(),
            b.channel_count()
        )));
    }
    Ok(())
}

/// Bring two sources to a common channel layout, up-mixing a mono side
pub fn align_layouts(a: Waveform, b: Waveform) -> Result<(Waveform, Waveform)> {
    if a.sample_rate != b.sample_rate {
        return Err(Error::IncompatibleSources(format!(
            "sample rates differ ({} Hz vs {} Hz)",
            a.sample_rate, b.sample_rate
        )));
    }
    let (ca, cb) = (a.channel_count(), b.channel_count());
    if ca == cb {
        return Ok((a, b));
    }
    if ca == 1 {
        log::debug!("Up-mixing first source from mono to {} channels", cb);
        return Ok((a.upmix(cb)?, b));
    }
    if cb == 1 {
        log::debug!("Up-mixing second source from mono to {} channels", ca);
        return Ok((a, b.upmix(ca)?));
    }
    Err(Error::IncompatibleSources(format!(
        "channel counts differ ({} vs {})",
        ca, cb
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_ragged_channels() {
        let result = Waveform::new(vec![vec![0.0; 4], vec![0.0; 3]], 44100);
        assert!(matches!(result, Err(Error::InvalidWaveform(_))));
    }

    #[test]
    fn test_rejects_zero_sample_rate() {
        assert!(Waveform::mono(vec![0.0; 4], 0).is_err());
        assert!(Waveform::new(Vec::new(), 44100).is_err());
    }

    #[test]
    fn test_interleave_round_trip() {
        let wf = Waveform::from_interleaved(&[1.0, -1.0, 2.0, -2.0, 3.0, -3.0], 2, 8000).unwrap();
        assert_eq!(wf.channel(0), &[1.0, 2.0, 3.0]);
        assert_eq!(wf.channel(1), &[-1.0, -2.0, -3.0]);
        assert_eq!(wf.to_interleaved(), vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
    }

    #[test]
    fn test_mix_to_mono_averages() {
        let wf = Waveform::new(vec![vec![1.0, 0.0], vec![0.0, 0.5]], 8000).unwrap();
        assert_eq!(wf.mix_to_mono(), vec![0.5, 0.25]);
    }

    #[test]
    fn test_append_requires_matching_layout() {
        let mut a = Waveform::mono(vec![0.1; 10], 8000).unwrap();
        let b = Waveform::mono(vec![0.2; 5], 16000).unwrap();
        assert!(a.append(b).is_err());

        let c = Waveform::mono(vec![0.2; 5], 8000).unwrap();
        a.append(c).unwrap();
        assert_eq!(a.frames(), 15);
    }

    #[test]
    fn test_align_layouts_upmixes_mono() {
        let a = Waveform::mono(vec![0.5; 4], 8000).unwrap();
        let b = Waveform::new(vec![vec![0.0; 4], vec![0.0; 4]], 8000).unwrap();
        let (a, b) = align_layouts(a, b).unwrap();
        assert_eq!(a.channel_count(), 2);
        assert_eq!(b.channel_count(), 2);
        assert_eq!(a.channel(1), &[0.5; 4]);
    }

    #[test]
    fn test_clamp_counts_samples() {
        let mut wf = Waveform::mono(vec![0.5, 1.5, -2.0], 8000).unwrap();
        assert_eq!(wf.clamp_to_full_scale(), 2);
        assert_eq!(wf.channel(0), &[0.5, 1.0, -1.0]);
    }
}
