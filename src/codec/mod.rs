//! Audio codec collaborators
//!
//! Decoding goes through symphonia; WAV output through hound and MP3
//! delivery files through LAME. Everything else in the crate only sees
//! `Waveform`.

mod decode;
mod mp3;
mod wav;

pub use decode::decode;
pub use mp3::{lame_bitrate, write_mp3};
pub use wav::{write_wav, WavEncoding};

use crate::error::Result;
use crate::model::Waveform;
use serde::Serialize;
use std::path::Path;

/// Container format for an output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputFormat {
    Wav(WavEncoding),
    Mp3 { bitrate_kbps: u32 },
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav(_) => "wav",
            OutputFormat::Mp3 { .. } => "mp3",
        }
    }
}

/// Write a waveform in the requested container format
pub fn encode(waveform: &Waveform, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Wav(encoding) => write_wav(waveform, path, encoding),
        OutputFormat::Mp3 { bitrate_kbps } => write_mp3(waveform, path, bitrate_kbps),
    }
}
