//! Materialize a parsed artifact as files and directories.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use codectx_core::{RelativePath, SnapshotWarning, WarningKind};
use codectx_format::ParsedArtifact;

use crate::ReconstructError;

/// Outcome of a reconstruction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconstructReport {
    /// Files written.
    pub succeeded: usize,
    /// Files that could not be written.
    pub failed: usize,
    /// Payload bytes written.
    pub bytes_written: u64,
    /// One entry per failed path.
    pub errors: Vec<SnapshotWarning>,
}

impl ReconstructReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    fn record_failure(&mut self, warning: SnapshotWarning) {
        warn!(path = %warning.path.display(), "{}", warning.message);
        self.failed += 1;
        self.errors.push(warning);
    }
}

/// Writes parsed artifact contents under a destination root.
///
/// A failure on one path never stops the others: every listed path is
/// attempted and failures are collected in the [`ReconstructReport`].
/// Nothing is rolled back.
#[derive(Debug, Clone)]
pub struct Reconstructor {
    dest: PathBuf,
}

impl Reconstructor {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self { dest: dest.into() }
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Write every path of `files` with its payload from `contents`.
    ///
    /// Paths must be relative and stay below the destination. Existing
    /// directories are reused and existing files overwritten, so running
    /// twice yields the same tree. Payloads without a listed path are
    /// ignored.
    pub fn reconstruct(
        &self,
        files: &[String],
        contents: &IndexMap<String, String>,
    ) -> Result<ReconstructReport, ReconstructError> {
        self.prepare()?;
        let mut report = ReconstructReport::default();

        for file in files {
            let Some(content) = contents.get(file) else {
                report.record_failure(SnapshotWarning::new(
                    file,
                    "No content block in artifact",
                    WarningKind::MissingContent,
                ));
                continue;
            };
            match self.write_file(file, content) {
                Ok(bytes) => {
                    report.succeeded += 1;
                    report.bytes_written += bytes;
                }
                Err(warning) => report.record_failure(warning),
            }
        }

        let listed: HashSet<&str> = files.iter().map(String::as_str).collect();
        for orphan in contents.keys().filter(|name| !listed.contains(name.as_str())) {
            debug!(path = %orphan, "content block without tree entry, not written");
        }

        info!(
            dest = %self.dest.display(),
            succeeded = report.succeeded,
            failed = report.failed,
            "reconstruction finished"
        );
        Ok(report)
    }

    /// Reconstruct a parsed artifact.
    pub fn reconstruct_parsed(
        &self,
        parsed: &ParsedArtifact,
    ) -> Result<ReconstructReport, ReconstructError> {
        self.reconstruct(&parsed.files, &parsed.contents)
    }

    /// Ensure the destination exists and is a directory.
    fn prepare(&self) -> Result<(), ReconstructError> {
        if self.dest.exists() && !self.dest.is_dir() {
            return Err(ReconstructError::NotADirectory {
                path: self.dest.clone(),
            });
        }
        fs::create_dir_all(&self.dest).map_err(|e| ReconstructError::io(&self.dest, e))
    }

    fn write_file(&self, file: &str, content: &str) -> Result<u64, SnapshotWarning> {
        let path = RelativePath::parse(file)
            .map_err(|e| SnapshotWarning::new(file, e.to_string(), WarningKind::InvalidPath))?;
        let full = path.to_path(&self.dest);

        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| SnapshotWarning::write_error(parent, &e))?;
        }
        fs::write(&full, content).map_err(|e| SnapshotWarning::write_error(&full, &e))?;

        debug!(path = %full.display(), bytes = content.len(), "wrote file");
        Ok(content.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn contents(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_reconstruct_creates_directories() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let files = vec!["a/b/c.txt".to_string(), "top.txt".to_string()];
        let map = contents(&[("a/b/c.txt", "deep"), ("top.txt", "top")]);

        let report = Reconstructor::new(&dest).reconstruct(&files, &map).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.bytes_written, 7);
        assert_eq!(fs::read_to_string(dest.join("a/b/c.txt")).unwrap(), "deep");
        assert_eq!(fs::read_to_string(dest.join("top.txt")).unwrap(), "top");
    }

    #[test]
    fn test_escaping_paths_rejected() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let files = vec![
            "../escape.txt".to_string(),
            "/abs.txt".to_string(),
            "ok.txt".to_string(),
        ];
        let map = contents(&[("../escape.txt", "x"), ("/abs.txt", "x"), ("ok.txt", "fine")]);

        let report = Reconstructor::new(&dest).reconstruct(&files, &map).unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 2);
        assert!(report.errors.iter().all(|e| e.kind == WarningKind::InvalidPath));
        assert!(!temp.path().join("escape.txt").exists());
        assert_eq!(fs::read_to_string(dest.join("ok.txt")).unwrap(), "fine");
    }

    #[test]
    fn test_missing_content_continues() {
        let temp = TempDir::new().unwrap();
        let files = vec!["missing.txt".to_string(), "present.txt".to_string()];
        let map = contents(&[("present.txt", "here"), ("orphan.txt", "unused")]);

        let report = Reconstructor::new(temp.path()).reconstruct(&files, &map).unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.errors[0].kind, WarningKind::MissingContent);
        assert!(!temp.path().join("missing.txt").exists());
        assert!(!temp.path().join("orphan.txt").exists());
    }

    #[test]
    fn test_write_failure_is_per_path() {
        let temp = TempDir::new().unwrap();
        // A regular file where a directory is needed.
        fs::write(temp.path().join("blocker"), "file").unwrap();
        let files = vec!["blocker/inner.txt".to_string(), "b.txt".to_string()];
        let map = contents(&[("blocker/inner.txt", "x"), ("b.txt", "y")]);

        let report = Reconstructor::new(temp.path()).reconstruct(&files, &map).unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].kind, WarningKind::WriteError);
        assert_eq!(fs::read_to_string(temp.path().join("b.txt")).unwrap(), "y");
    }

    #[test]
    fn test_destination_must_be_directory() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("file");
        fs::write(&dest, "x").unwrap();

        let err = Reconstructor::new(&dest)
            .reconstruct(&[], &IndexMap::new())
            .unwrap_err();
        assert!(matches!(err, ReconstructError::NotADirectory { .. }));
    }
}
