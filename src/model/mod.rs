//! Core data model shared by every processing stage
//!
//! These types are independent of both the input containers and the
//! delivery formats.

mod splice;
mod waveform;

pub use splice::{BeatTimeline, SplicePoint};
pub use waveform::{align_layouts, ensure_compatible, Waveform};
