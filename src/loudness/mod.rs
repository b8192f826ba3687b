//! Loudness measurement and normalization
//!
//! Measurement is EBU R128 integrated loudness via the ebur128 crate.
//! Nothing is cached: every mutation of a waveform needs a fresh
//! measurement.

mod meter;
mod normalizer;

pub use meter::integrated_loudness;
pub use normalizer::{LoudnessNormalizer, NormalizationReport, NormalizationStatus, DAMPING};
