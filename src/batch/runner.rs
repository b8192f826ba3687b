//! Parallel batch execution with per-job isolation

use super::grouping::InputGroup;
use crate::analysis::BeatTracker;
use crate::codec::OutputFormat;
use crate::process::{JobRequest, JoinMode, Pipeline};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Error,
}

/// Per-job result as reported to the user
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub filename: String,
    pub status: JobStatus,
    /// Output files keyed by extension
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_lufs: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl JobOutcome {
    fn failed(filename: &str, message: String) -> Self {
        Self {
            filename: filename.to_string(),
            status: JobStatus::Error,
            outputs: BTreeMap::new(),
            error: Some(message),
            final_lufs: None,
            warnings: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Success
    }
}

/// Batch-level settings that are not part of the processing configuration
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub join_mode: JoinMode,
    pub write_mp3: bool,
}

impl BatchOptions {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            join_mode: JoinMode::default(),
            write_mp3: true,
        }
    }

    pub fn with_join_mode(mut self, mode: JoinMode) -> Self {
        self.join_mode = mode;
        self
    }

    pub fn with_mp3(mut self, enable: bool) -> Self {
        self.write_mp3 = enable;
        self
    }
}

/// Build the pipeline request for one input group
pub fn build_request<T: BeatTracker>(
    group: &InputGroup,
    pipeline: &Pipeline<T>,
    options: &BatchOptions,
) -> Option<JobRequest> {
    let first = group.first.clone()?;
    let mut request = match &group.second {
        Some(second) => JobRequest::pair(&group.name, first, second.clone(), options.join_mode),
        None => JobRequest::single(&group.name, first),
    };

    let config = pipeline.config();
    let wav = OutputFormat::Wav(config.wav_encoding);
    request = request.with_output(group.output_path(&options.output_dir, wav.extension()), wav);
    if options.write_mp3 {
        let mp3 = OutputFormat::Mp3 {
            bitrate_kbps: config.mp3_bitrate_kbps,
        };
        request = request.with_output(group.output_path(&options.output_dir, mp3.extension()), mp3);
    }
    Some(request)
}

/// Run every group; a failing job never affects the others
pub fn run_batch<T: BeatTracker>(
    groups: &[InputGroup],
    pipeline: &Pipeline<T>,
    options: &BatchOptions,
) -> Vec<JobOutcome> {
    log::info!("Processing {} job(s)...", groups.len());

    // Jobs share one flat output directory
    let collisions = colliding_stems(groups);
    for stem in &collisions {
        log::warn!("Several inputs would write '{}_final'; skipping them", stem);
    }

    let outcomes: Vec<JobOutcome> = groups
        .par_iter()
        .map(|group| {
            if !group.is_orphan() && collisions.contains(&group.stem().to_lowercase()) {
                JobOutcome::failed(
                    &group.name,
                    format!(
                        "output name '{}_final' is shared with another input",
                        group.stem()
                    ),
                )
            } else {
                run_group(group, pipeline, options)
            }
        })
        .collect();

    let ok = outcomes.iter().filter(|o| o.is_success()).count();
    log::info!("Batch complete: {} succeeded, {} failed", ok, outcomes.len() - ok);
    outcomes
}

/// Output stems claimed by more than one runnable group, lowercased
fn colliding_stems(groups: &[InputGroup]) -> HashSet<String> {
    let mut claims: HashMap<String, usize> = HashMap::new();
    for group in groups.iter().filter(|g| !g.is_orphan()) {
        *claims.entry(group.stem().to_lowercase()).or_default() += 1;
    }
    claims
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(stem, _)| stem)
        .collect()
}

fn run_group<T: BeatTracker>(
    group: &InputGroup,
    pipeline: &Pipeline<T>,
    options: &BatchOptions,
) -> JobOutcome {
    let Some(request) = build_request(group, pipeline, options) else {
        log::warn!("[{}] Second part without a first part", group.name);
        return JobOutcome::failed(&group.name, "missing first part".to_string());
    };

    match pipeline.process(&request) {
        Ok(report) => JobOutcome {
            filename: group.name.clone(),
            status: JobStatus::Success,
            outputs: report
                .outputs
                .iter()
                .map(|p| (extension_of(p), p.clone()))
                .collect(),
            error: None,
            final_lufs: Some(report.final_lufs),
            warnings: report.warnings,
        },
        Err(e) => {
            log::error!("{}", e);
            JobOutcome::failed(&group.name, e.to_string())
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_string()
}
