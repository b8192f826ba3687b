//! Audio analysis layer
//!
//! Beat tracking sits behind the `BeatTracker` trait so detection can be
//! swapped for a fixed grid. Window features (RMS, magnitude spectrogram)
//! feed the splice selector.

mod features;
mod stratum;
mod stub;
mod traits;

pub use features::{comparison_window, rms, Spectrogram, Stft, WindowFeatures, FFT_SIZE, HOP_SIZE};
pub use stratum::StratumBeatTracker;
pub use stub::FixedBeatTracker;
pub use traits::BeatTracker;
