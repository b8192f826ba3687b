//! Output verification by re-decoding written files

use crate::codec;
use crate::loudness::integrated_loudness;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Loudness of a file as read back from disk
#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub path: PathBuf,
    pub loudness: f64,
    pub deviation: f64,
    pub within_tolerance: bool,
    pub frames: usize,
    pub sample_rate: u32,
}

/// Re-decode a written output and re-measure its integrated loudness
///
/// # Arguments
/// * `path` - File to check
/// * `target` - Expected loudness in LUFS
/// * `tolerance` - Accepted deviation in LU
pub fn verify_output(path: &Path, target: f64, tolerance: f64) -> Result<Verification> {
    log::info!("Verifying output: {:?}", path);

    let metadata =
        std::fs::metadata(path).with_context(|| format!("Output not found: {:?}", path))?;
    log::debug!("Output size: {} bytes", metadata.len());

    let waveform =
        codec::decode(path).with_context(|| format!("Failed to decode output: {:?}", path))?;
    let loudness = integrated_loudness(&waveform)
        .with_context(|| format!("Failed to measure output: {:?}", path))?;

    let deviation = loudness - target;
    let within_tolerance = deviation.abs() <= tolerance;
    if within_tolerance {
        log::info!("✅ {:?}: {:.2} LUFS ({:+.2} LU)", path, loudness, deviation);
    } else {
        log::warn!("❌ {:?}: {:.2} LUFS ({:+.2} LU)", path, loudness, deviation);
    }

    Ok(Verification {
        path: path.to_path_buf(),
        loudness,
        deviation,
        within_tolerance,
        frames: waveform.frames(),
        sample_rate: waveform.sample_rate(),
    })
}

/// Verify every output; fails the run when any of them misses the target
pub fn verify_outputs<'a, I>(paths: I, target: f64, tolerance: f64) -> Result<Vec<Verification>>
where
    I: IntoIterator<Item = &'a Path>,
{
    let results = paths
        .into_iter()
        .map(|path| verify_output(path, target, tolerance))
        .collect::<Result<Vec<_>>>()?;

    let missed: Vec<&Path> = results
        .iter()
        .filter(|v| !v.within_tolerance)
        .map(|v| v.path.as_path())
        .collect();
    if !missed.is_empty() {
        anyhow::bail!(
            "{} of {} output(s) missed {:.1} LUFS: {:?}",
            missed.len(),
            results.len(),
            target,
            missed
        );
    }

    log::info!("✅ All {} output(s) within tolerance", results.len());
    Ok(results)
}
