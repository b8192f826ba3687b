//! Container decoding via symphonia
//!
//! Decodes the first audio track of a file into a planar `Waveform`,
//! preserving the source channel layout and sample rate.

use crate::error::{Error, Result};
use crate::model::Waveform;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode an audio file to a planar waveform
pub fn decode(path: &Path) -> Result<Waveform> {
    log::debug!("Decoding: {:?}", path);

    let corrupt = |reason: String| Error::UnsupportedFormatOrCorruptFile {
        path: path.to_path_buf(),
        reason,
    };

    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(ext.to_str().unwrap_or(""));
    }

    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| corrupt(format!("probe failed: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| corrupt("no audio track found".into()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());

    let dec_opts = DecoderOptions::default();
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &dec_opts)
        .map_err(|e| corrupt(format!("no decoder: {}", e)))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut decode_errors = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(e) if is_end_of_stream(&e) => break,
            Err(SymphoniaError::ResetRequired) => {
                log::warn!("Decoder reset requested in {:?}, stopping early", path);
                break;
            }
            Err(e) => return Err(corrupt(format!("failed to read packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Error decoding packet: {}", e);
                decode_errors += 1;
                continue;
            }
            Err(e) => return Err(corrupt(format!("decode failed: {}", e))),
        };

        let spec = *decoded.spec();
        let packet_channels = spec.channels.count();
        match channels {
            Some(n) if n != packet_channels => {
                return Err(corrupt(format!(
                    "channel count changed mid-stream ({} -> {})",
                    n, packet_channels
                )));
            }
            None => channels = Some(packet_channels),
            _ => {}
        }
        sample_rate.get_or_insert(spec.rate);

        let duration = decoded.capacity() as u64;
        let mut sample_buf = SampleBuffer::<f32>::new(duration, spec);
        sample_buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(sample_buf.samples());
    }

    let channels = channels.ok_or_else(|| corrupt("unknown channel layout".into()))?;
    let sample_rate = sample_rate.ok_or_else(|| corrupt("no sample rate in audio track".into()))?;

    if interleaved.is_empty() {
        return Err(corrupt(if decode_errors > 0 {
            format!("all {} packets failed to decode", decode_errors)
        } else {
            "no audio frames".into()
        }));
    }

    let waveform = Waveform::from_interleaved(&interleaved, channels, sample_rate)
        .map_err(|e| corrupt(e.to_string()))?;

    log::debug!(
        "Decoded {} frames ({:.1}s) x {} channels at {}Hz",
        waveform.frames(),
        waveform.duration_secs(),
        waveform.channel_count(),
        sample_rate
    );

    Ok(waveform)
}

/// End of input is the only packet-read error that ends a stream cleanly
fn is_end_of_stream(err: &SymphoniaError) -> bool {
    matches!(err, SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_requires_file() {
        let result = decode(Path::new("/nonexistent/file.wav"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not a RIFF header").unwrap();

        let result = decode(&path);
        assert!(matches!(
            result,
            Err(Error::UnsupportedFormatOrCorruptFile { .. })
        ));
    }

    #[test]
    fn test_only_eof_ends_stream_cleanly() {
        use std::io::{Error as IoError, ErrorKind};

        let eof = SymphoniaError::IoError(IoError::new(ErrorKind::UnexpectedEof, "end"));
        assert!(is_end_of_stream(&eof));

        let broken = SymphoniaError::IoError(IoError::new(ErrorKind::Other, "bad sector"));
        assert!(!is_end_of_stream(&broken));
        assert!(!is_end_of_stream(&SymphoniaError::DecodeError("invalid frame")));
        assert!(!is_end_of_stream(&SymphoniaError::ResetRequired));
    }
}
