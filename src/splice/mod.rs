//! Finding and materializing the seam between two recordings

pub mod config;
mod joiner;
mod selector;

pub use config::SpliceConfig;
pub use joiner::{concatenate, crossfade_join, CrossfadeCurve};
pub use selector::{find_splice_points, rank_candidates};
