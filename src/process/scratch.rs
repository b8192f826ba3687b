//! Scratch file management for intermediate joined audio

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory holding per-job intermediate files
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    root: PathBuf,
}

impl ScratchSpace {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Reserve a job-unique file name; the file is removed when the guard drops
    ///
    /// Names are `<job id>-<uuid>.<ext>` so concurrent jobs never collide,
    /// even when two jobs share a base name.
    pub fn reserve(&self, job_id: &str, extension: &str) -> Result<ScratchFile> {
        fs::create_dir_all(&self.root)?;
        let name = format!("{}-{}.{}", sanitize(job_id), Uuid::new_v4(), extension);
        let path = self.root.join(name);
        log::debug!("Reserved scratch file {:?}", path);
        Ok(ScratchFile { path })
    }
}

/// Intermediate file deleted on drop, on success and failure paths alike
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed scratch file {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove scratch file {:?}: {}", self.path, e),
        }
    }
}

/// Keep file names portable: alphanumerics, `-` and `_` only
fn sanitize(job_id: &str) -> String {
    let cleaned: String = job_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(64)
        .collect();
    if cleaned.is_empty() {
        "job".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique_per_reservation() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::new(dir.path().to_path_buf());
        let a = scratch.reserve("show", "wav").unwrap();
        let b = scratch.reserve("show", "wav").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(dir.path()));
    }

    #[test]
    fn test_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::new(dir.path().to_path_buf());
        let path = {
            let file = scratch.reserve("job", "wav").unwrap();
            fs::write(file.path(), b"data").unwrap();
            assert!(file.path().exists());
            file.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("my show/ep 1.wav"), "my_show_ep_1_wav");
        assert_eq!(sanitize(""), "job");
    }
}
