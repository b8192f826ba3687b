//! MP3 delivery encoding via LAME

use crate::error::{Error, Result};
use crate::model::Waveform;
use mp3lame_encoder::{Bitrate, Builder, Encoder, FlushNoGap, InterleavedPcm, MonoPcm, Quality};
use std::path::Path;

/// Samples per channel handed to LAME per call
const CHUNK_FRAMES: usize = 1152 * 64;

/// Map a kbps value onto LAME's fixed CBR bitrates
pub fn lame_bitrate(kbps: u32) -> Option<Bitrate> {
    let bitrate = match kbps {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        _ => return None,
    };
    Some(bitrate)
}

/// Encode a mono or stereo waveform to a CBR MP3 file
pub fn write_mp3(waveform: &Waveform, path: &Path, bitrate_kbps: u32) -> Result<()> {
    let encode_err = |reason: String| Error::Encode {
        path: path.to_path_buf(),
        reason,
    };

    let channels = waveform.channel_count();
    if channels > 2 {
        return Err(encode_err(format!(
            "MP3 supports at most 2 channels, got {}",
            channels
        )));
    }
    let bitrate = lame_bitrate(bitrate_kbps).ok_or_else(|| {
        Error::InvalidConfig(format!("unsupported MP3 bitrate {} kbps", bitrate_kbps))
    })?;

    let mut encoder = create_encoder(channels as u8, waveform.sample_rate(), bitrate)
        .map_err(encode_err)?;

    let mut mp3_buffer: Vec<u8> = Vec::new();
    let mut start = 0;
    while start < waveform.frames() {
        let end = (start + CHUNK_FRAMES).min(waveform.frames());
        // LAME recommendation: 1.25 * num_samples + 7200 bytes
        mp3_buffer.reserve(((end - start) as f64 * 1.25 + 7200.0) as usize);

        let written = if channels == 1 {
            let input = MonoPcm(&waveform.channel(0)[start..end]);
            encoder.encode(input, mp3_buffer.spare_capacity_mut())
        } else {
            let interleaved: Vec<f32> = waveform.channel(0)[start..end]
                .iter()
                .zip(&waveform.channel(1)[start..end])
                .flat_map(|(&l, &r)| [l, r])
                .collect();
            encoder.encode(InterleavedPcm(&interleaved), mp3_buffer.spare_capacity_mut())
        }
        .map_err(|e| encode_err(format!("LAME encoding error: {:?}", e)))?;

        // SAFETY: LAME guarantees it wrote exactly `written` bytes into spare capacity.
        unsafe {
            mp3_buffer.set_len(mp3_buffer.len() + written);
        }
        start = end;
    }

    mp3_buffer.reserve(7200);
    let flushed = encoder
        .flush::<FlushNoGap>(mp3_buffer.spare_capacity_mut())
        .map_err(|e| encode_err(format!("LAME flush error: {:?}", e)))?;
    // SAFETY: as above, `flushed` bytes were initialized by LAME.
    unsafe {
        mp3_buffer.set_len(mp3_buffer.len() + flushed);
    }

    std::fs::write(path, &mp3_buffer)?;

    log::debug!(
        "Wrote {:?} ({} bytes at {} kbps)",
        path,
        mp3_buffer.len(),
        bitrate_kbps
    );
    Ok(())
}

/// Creates and configures a LAME encoder instance
fn create_encoder(
    channels: u8,
    sample_rate: u32,
    bitrate: Bitrate,
) -> std::result::Result<Encoder, String> {
    let mut builder = Builder::new().ok_or("Failed to create LAME encoder builder")?;
    builder
        .set_num_channels(channels)
        .map_err(|e| format!("Failed to set channel count: {:?}", e))?;
    builder
        .set_sample_rate(sample_rate)
        .map_err(|e| format!("Failed to set sample rate: {:?}", e))?;
    builder
        .set_brate(bitrate)
        .map_err(|e| format!("Failed to set bitrate: {:?}", e))?;
    builder
        .set_quality(Quality::Best)
        .map_err(|e| format!("Failed to set encoding quality: {:?}", e))?;

    builder
        .build()
        .map_err(|e| format!("Failed to build LAME encoder: {:?}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitrate_mapping() {
        assert!(lame_bitrate(320).is_some());
        assert!(lame_bitrate(128).is_some());
        assert!(lame_bitrate(321).is_none());
    }

    #[test]
    fn test_rejects_surround() {
        let dir = tempfile::tempdir().unwrap();
        let wf = Waveform::new(vec![vec![0.0; 100]; 6], 48000).unwrap();
        let result = write_mp3(&wf, &dir.path().join("x.mp3"), 320);
        assert!(matches!(result, Err(Error::Encode { .. })));
    }

    #[test]
    fn test_stereo_mp3_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.mp3");
        let tone: Vec<f32> = (0..44100)
            .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let wf = Waveform::new(vec![tone.clone(), tone], 44100).unwrap();

        write_mp3(&wf, &path, 320).unwrap();
        let back = crate::codec::decode(&path).unwrap();

        assert_eq!(back.channel_count(), 2);
        assert_eq!(back.sample_rate(), 44100);
        assert!(back.frames() >= 44100);
    }
}
