//! WAV writing via hound

use crate::error::{Error, Result};
use crate::model::Waveform;
use hound::{SampleFormat, WavSpec, WavWriter};
use serde::Serialize;
use std::path::Path;

/// Sample encoding for WAV output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum WavEncoding {
    /// 16-bit signed integer PCM
    #[default]
    Pcm16,
    /// 24-bit signed integer PCM
    Pcm24,
    /// 32-bit IEEE float, keeps samples beyond full scale intact
    Float32,
}

impl WavEncoding {
    fn spec(&self, channels: u16, sample_rate: u32) -> WavSpec {
        let (bits_per_sample, sample_format) = match self {
            WavEncoding::Pcm16 => (16, SampleFormat::Int),
            WavEncoding::Pcm24 => (24, SampleFormat::Int),
            WavEncoding::Float32 => (32, SampleFormat::Float),
        };
        WavSpec {
            channels,
            sample_rate,
            bits_per_sample,
            sample_format,
        }
    }
}

/// Write a waveform as a WAV file
///
/// Integer encodings saturate at full scale when quantizing.
pub fn write_wav(waveform: &Waveform, path: &Path, encoding: WavEncoding) -> Result<()> {
    let encode_err = |reason: String| Error::Encode {
        path: path.to_path_buf(),
        reason,
    };

    let channels = u16::try_from(waveform.channel_count())
        .map_err(|_| encode_err("too many channels for WAV".into()))?;
    let spec = encoding.spec(channels, waveform.sample_rate());

    let mut writer = WavWriter::create(path, spec).map_err(|e| encode_err(e.to_string()))?;

    let interleaved = waveform.to_interleaved();
    let written: std::result::Result<(), hound::Error> = match encoding {
        WavEncoding::Pcm16 => interleaved
            .iter()
            .try_for_each(|&s| writer.write_sample(quantize(s, i16::MAX as f32) as i16)),
        WavEncoding::Pcm24 => interleaved
            .iter()
            .try_for_each(|&s| writer.write_sample(quantize(s, 8_388_607.0))),
        WavEncoding::Float32 => interleaved.iter().try_for_each(|&s| writer.write_sample(s)),
    };
    written.map_err(|e| encode_err(e.to_string()))?;

    writer.finalize().map_err(|e| encode_err(e.to_string()))?;

    log::debug!(
        "Wrote {:?} ({} frames, {:?})",
        path,
        waveform.frames(),
        encoding
    );
    Ok(())
}

fn quantize(sample: f32, full_scale: f32) -> i32 {
    (sample * full_scale).round().clamp(-full_scale - 1.0, full_scale) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;

    #[test]
    fn test_quantize_saturates() {
        assert_eq!(quantize(2.0, i16::MAX as f32), i16::MAX as i32);
        assert_eq!(quantize(-2.0, i16::MAX as f32), i16::MIN as i32);
        assert_eq!(quantize(0.0, i16::MAX as f32), 0);
    }

    #[test]
    fn test_float_wav_preserves_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let wf = Waveform::new(vec![vec![0.25, -0.5, 1.5], vec![0.0, 0.125, -1.25]], 48000).unwrap();

        write_wav(&wf, &path, WavEncoding::Float32).unwrap();
        let back = decode(&path).unwrap();

        assert_eq!(back, wf);
    }

    #[test]
    fn test_pcm16_keeps_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pcm.wav");
        let wf = Waveform::mono(vec![0.5; 1000], 22050).unwrap();

        write_wav(&wf, &path, WavEncoding::Pcm16).unwrap();
        let back = decode(&path).unwrap();

        assert_eq!(back.sample_rate(), 22050);
        assert_eq!(back.channel_count(), 1);
        assert_eq!(back.frames(), 1000);
        assert!((back.channel(0)[10] - 0.5).abs() < 1e-3);
    }
}
