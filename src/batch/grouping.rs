//! Input file grouping
//!
//! `name_pt2.ext` is the second part of `name.ext` in the same directory.
//! Only WAV and MP3 inputs are accepted.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Input extensions accepted by the batch boundary (compared lowercase)
pub const ACCEPTED_EXTENSIONS: &[&str] = &["wav", "mp3"];

fn part_two_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Only a `_pt2` right before the final extension counts
    PATTERN.get_or_init(|| Regex::new(r"_pt2(\.[^.]+)$").expect("static regex"))
}

/// Whether the file has an accepted audio extension
pub fn is_accepted(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            ACCEPTED_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Strip a `_pt2` marker from a file name: `show_pt2.wav` -> `show.wav`
pub fn base_file_name(file_name: &str) -> String {
    part_two_pattern().replace(file_name, "$1").into_owned()
}

fn is_part_two(file_name: &str) -> bool {
    part_two_pattern().is_match(file_name)
}

/// One logical job before it is handed to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputGroup {
    /// Base file name, `_pt2` removed (e.g. `show.wav`)
    pub name: String,
    pub first: Option<PathBuf>,
    pub second: Option<PathBuf>,
}

impl InputGroup {
    /// Output stem: the base name without its extension
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }

    /// `<stem>_final.<ext>` inside `output_dir`
    pub fn output_path(&self, output_dir: &Path, extension: &str) -> PathBuf {
        output_dir.join(format!("{}_final.{}", self.stem(), extension))
    }

    pub fn is_orphan(&self) -> bool {
        self.first.is_none()
    }
}

/// Result of sorting a list of candidate input files
#[derive(Debug, Default)]
pub struct GroupedInputs {
    pub groups: Vec<InputGroup>,
    /// Files rejected for their extension
    pub skipped: Vec<PathBuf>,
}

/// Group files into jobs, deterministically ordered by directory and name
pub fn group_files<I>(files: I) -> GroupedInputs
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut grouped: BTreeMap<(PathBuf, String), InputGroup> = BTreeMap::new();
    let mut skipped = Vec::new();

    for path in files {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
            skipped.push(path);
            continue;
        };
        if !is_accepted(&path) {
            log::warn!("Skipping unsupported file: {:?}", path);
            skipped.push(path);
            continue;
        }

        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = base_file_name(&file_name);
        let group = grouped
            .entry((dir, name.clone()))
            .or_insert_with(|| InputGroup {
                name,
                first: None,
                second: None,
            });

        let slot = if is_part_two(&file_name) {
            &mut group.second
        } else {
            &mut group.first
        };
        if let Some(previous) = slot.replace(path) {
            log::warn!("Duplicate input {:?} ignored", previous);
        }
    }

    GroupedInputs {
        groups: grouped.into_values().collect(),
        skipped,
    }
}
