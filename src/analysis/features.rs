//! Windowed amplitude and spectral features
//!
//! A comparison window is a short slice of mono samples centered on a beat.
//! Its RMS and magnitude spectrogram are what the splice selector compares.

use crate::error::{Error, Result};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// FFT length of the comparison spectrogram
pub const FFT_SIZE: usize = 2048;
/// Hop between spectrogram frames
pub const HOP_SIZE: usize = 512;

/// Slice `[floor((center - half)·sr), floor((center + half)·sr))` out of `samples`
///
/// Windows that would read before the first or past the last sample are
/// rejected with `OutOfRangeWindow`.
pub fn comparison_window(
    samples: &[f32],
    sample_rate: u32,
    center: f64,
    half_width: f64,
) -> Result<&[f32]> {
    if samples.is_empty() {
        return Err(Error::EmptyInput);
    }
    let sr = sample_rate as f64;
    let start = ((center - half_width) * sr).floor() as i64;
    let end = ((center + half_width) * sr).floor() as i64;

    if start < 0 || end > samples.len() as i64 || end <= start {
        return Err(Error::OutOfRangeWindow {
            center,
            start,
            end,
            len: samples.len(),
        });
    }
    Ok(&samples[start as usize..end as usize])
}

/// Root-mean-square amplitude
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt()
}

/// Magnitude spectrogram, frame-major
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    frames: usize,
    bins: usize,
    magnitudes: Vec<f32>,
}

impl Spectrogram {
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn frame(&self, idx: usize) -> &[f32] {
        &self.magnitudes[idx * self.bins..(idx + 1) * self.bins]
    }

    /// Mean absolute magnitude difference over the shared frame/bin extent
    pub fn mean_abs_difference(&self, other: &Spectrogram) -> f64 {
        let frames = self.frames.min(other.frames);
        let bins = self.bins.min(other.bins);
        if frames == 0 || bins == 0 {
            return 0.0;
        }
        let mut total = 0.0f64;
        for f in 0..frames {
            let (a, b) = (self.frame(f), other.frame(f));
            total += a[..bins]
                .iter()
                .zip(&b[..bins])
                .map(|(x, y)| (x - y).abs() as f64)
                .sum::<f64>();
        }
        total / (frames * bins) as f64
    }
}

/// Reusable short-time Fourier transform with a periodic Hann window
#[derive(Clone)]
pub struct Stft {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    hop: usize,
}

impl Stft {
    pub fn new(fft_size: usize, hop: usize) -> Self {
        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_size);
        let window = (0..fft_size)
            .map(|n| {
                0.5 - 0.5 * (2.0 * std::f32::consts::PI * n as f32 / fft_size as f32).cos()
            })
            .collect();
        Self {
            fft,
            window,
            hop: hop.max(1),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.window.len()
    }

    /// Centered STFT magnitudes; the signal is zero-padded by half a frame
    /// on each side so frame `k` is centered on sample `k * hop`.
    pub fn magnitudes(&self, samples: &[f32]) -> Result<Spectrogram> {
        if samples.is_empty() {
            return Err(Error::EmptyInput);
        }
        let n_fft = self.fft_size();
        let half = (n_fft / 2) as i64;
        let bins = n_fft / 2 + 1;
        let frames = 1 + samples.len() / self.hop;

        let mut magnitudes = Vec::with_capacity(frames * bins);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];

        for f in 0..frames {
            let origin = (f * self.hop) as i64 - half;
            for (n, slot) in buffer.iter_mut().enumerate() {
                let idx = origin + n as i64;
                let s = if idx >= 0 && (idx as usize) < samples.len() {
                    samples[idx as usize]
                } else {
                    0.0
                };
                *slot = Complex::new(s * self.window[n], 0.0);
            }
            self.fft.process(&mut buffer);
            magnitudes.extend(buffer[..bins].iter().map(|c| c.norm()));
        }

        Ok(Spectrogram {
            frames,
            bins,
            magnitudes,
        })
    }
}

impl Default for Stft {
    fn default() -> Self {
        Self::new(FFT_SIZE, HOP_SIZE)
    }
}

impl std::fmt::Debug for Stft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stft")
            .field("fft_size", &self.fft_size())
            .field("hop", &self.hop)
            .finish()
    }
}

/// RMS and spectrum of one comparison window
#[derive(Debug, Clone)]
pub struct WindowFeatures {
    pub rms: f64,
    pub spectrum: Spectrogram,
}

impl WindowFeatures {
    /// Features of the window centered on `center` seconds
    pub fn extract(
        samples: &[f32],
        sample_rate: u32,
        center: f64,
        half_width: f64,
        stft: &Stft,
    ) -> Result<Self> {
        let window = comparison_window(samples, sample_rate, center, half_width)?;
        Ok(Self {
            rms: rms(window),
            spectrum: stft.magnitudes(window)?,
        })
    }

    /// Similarity in (0, 1]: `1 / (1 + |Δrms| + mean|ΔS|)`
    pub fn similarity(&self, other: &WindowFeatures) -> f64 {
        let amp_diff = (self.rms - other.rms).abs();
        let spec_diff = self.spectrum.mean_abs_difference(&other.spectrum);
        1.0 / (1.0 + amp_diff + spec_diff)
    }
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
    fn test_window_bounds() {
        let samples = vec![0.0f32; 1000];
        let w = comparison_window(&samples, 1000, 0.5, 0.1).unwrap();
        assert_eq!(w.len(), 200);

        assert!(matches!(
            comparison_window(&samples, 1000, 0.05, 0.1),
            Err(Error::OutOfRangeWindow { .. })
        ));
        assert!(matches!(
            comparison_window(&samples, 1000, 0.95, 0.1),
            Err(Error::OutOfRangeWindow { .. })
        ));
        // Window ending exactly on the last sample is in range
        assert!(comparison_window(&samples, 1000, 0.9, 0.1).is_ok());
    }

    #[test]
    fn test_window_rejects_empty() {
        assert!(matches!(
            comparison_window(&[], 1000, 0.5, 0.1),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_rms_of_sine() {
        let s = sine(440.0, 1.0, 44100, 1.0);
        assert!((rms(&s) - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-3);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_spectrogram_shape_and_peak() {
        let sr = 44100;
        let s = sine(1000.0, 0.5, sr, 0.2);
        let spec = Stft::default().magnitudes(&s).unwrap();

        assert_eq!(spec.bins(), FFT_SIZE / 2 + 1);
        assert_eq!(spec.frames(), 1 + s.len() / HOP_SIZE);

        // The loudest bin of a middle frame sits at 1 kHz
        let frame = spec.frame(spec.frames() / 2);
        let peak_bin = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        let expected = (1000.0 * FFT_SIZE as f32 / sr as f32).round() as usize;
        assert!((peak_bin as i64 - expected as i64).abs() <= 1);
    }

    #[test]
    fn test_identical_windows_score_one() {
        let s = sine(220.0, 0.4, 22050, 1.0);
        let stft = Stft::default();
        let a = WindowFeatures::extract(&s, 22050, 0.5, 0.1, &stft).unwrap();
        let b = WindowFeatures::extract(&s, 22050, 0.5, 0.1, &stft).unwrap();
        assert_eq!(a.similarity(&b), 1.0);
    }

    #[test]
    fn test_different_windows_score_lower() {
        let loud = sine(220.0, 0.8, 22050, 1.0);
        let quiet = sine(3000.0, 0.1, 22050, 1.0);
        let stft = Stft::default();
        let a = WindowFeatures::extract(&loud, 22050, 0.5, 0.1, &stft).unwrap();
        let b = WindowFeatures::extract(&quiet, 22050, 0.5, 0.1, &stft).unwrap();
        let score = a.similarity(&b);
        assert!(score > 0.0 && score < 0.9, "score {}", score);
    }
}
