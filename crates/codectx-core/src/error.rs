//! Error and warning types shared by every codectx crate.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors raised while configuring or producing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// An ignore or include pattern is not a valid glob.
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A path cannot be expressed relative to the snapshot root.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl SnapshotError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while parsing an artifact.
///
/// A format error aborts the whole parse, so no reconstruction happens from
/// a partially understood artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// A required section marker is absent.
    #[error("Malformed artifact: missing '{marker}' marker")]
    MissingMarker { marker: &'static str },

    /// The artifact declares a format version this build cannot read.
    #[error("Unsupported artifact format version: {version}")]
    UnsupportedVersion { version: String },

    /// A block header could not be parsed.
    #[error("Malformed block header at byte {offset}: {header:?}")]
    MalformedBlock { offset: usize, header: String },

    /// A block ends before its declared length.
    #[error("Truncated block for '{path}': expected {expected} bytes")]
    Truncated { path: String, expected: usize },
}

/// Kind of non-fatal warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading a file or directory.
    ReadError,
    /// Path cannot be represented in an artifact or escapes the root.
    InvalidPath,
    /// Entry deliberately left out (symlinks, special files).
    Skipped,
    /// Error creating a directory or writing a file.
    WriteError,
    /// A listed file has no content block.
    MissingContent,
}

/// Non-fatal warning encountered while walking, writing or reconstructing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl SnapshotWarning {
    /// Create a new warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning from an I/O error, keeping permission problems distinct.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        let kind = match error.kind() {
            std::io::ErrorKind::PermissionDenied => WarningKind::PermissionDenied,
            _ => WarningKind::ReadError,
        };
        Self {
            message: format!("Read error: {error}"),
            path,
            kind,
        }
    }

    /// Create a write error warning.
    pub fn write_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self {
            path: path.into(),
            message: format!("Write error: {error}"),
            kind: WarningKind::WriteError,
        }
    }
}

impl std::fmt::Display for SnapshotWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_error_io() {
        let err = SnapshotError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, SnapshotError::PermissionDenied { .. }));

        let err = SnapshotError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, SnapshotError::NotFound { .. }));
    }

    #[test]
    fn test_read_error_kind() {
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let warning = SnapshotWarning::read_error("/test/path", &denied);
        assert_eq!(warning.kind, WarningKind::PermissionDenied);

        let other = std::io::Error::other("boom");
        let warning = SnapshotWarning::read_error("/test/path", &other);
        assert_eq!(warning.kind, WarningKind::ReadError);
        assert!(warning.message.contains("boom"));
    }

    #[test]
    fn test_format_error_message() {
        let err = FormatError::MissingMarker {
            marker: "File Contents:",
        };
        assert_eq!(
            err.to_string(),
            "Malformed artifact: missing 'File Contents:' marker"
        );
    }
}
