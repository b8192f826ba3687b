//! Analysis trait definitions

use crate::error::Result;
use crate::model::{BeatTimeline, Waveform};

/// Beat tracker trait - allows swapping between fixed grids and real detection
pub trait BeatTracker: Send + Sync {
    /// Estimate tempo and beat positions (seconds) for a whole waveform
    fn track(&self, waveform: &Waveform) -> Result<BeatTimeline>;
}
