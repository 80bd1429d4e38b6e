//! Root-relative paths rendered with `/` on every host.

use std::path::{Component, Path, PathBuf};

use compact_str::CompactString;
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SnapshotError;

/// A path relative to a snapshot root, stored as its segments.
///
/// Every segment is non-empty, valid UTF-8, free of `/` and newlines, and is
/// neither `.` nor `..`. The empty path denotes the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelativePath {
    segments: Vec<CompactString>,
}

impl RelativePath {
    /// The root path (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a `/`-separated path as it appears in an artifact.
    pub fn parse(text: &str) -> Result<Self, SnapshotError> {
        if text.is_empty() {
            return Err(SnapshotError::invalid_path(text, "path is empty"));
        }
        if text.starts_with('/') {
            return Err(SnapshotError::invalid_path(text, "path is absolute"));
        }
        let mut segments = Vec::new();
        for segment in text.split('/') {
            validate_segment(text, segment)?;
            segments.push(CompactString::new(segment));
        }
        Ok(Self { segments })
    }

    /// Express `path` relative to `root`.
    pub fn from_path(root: &Path, path: &Path) -> Result<Self, SnapshotError> {
        let display = path.display().to_string();
        let relative = path
            .strip_prefix(root)
            .map_err(|_| SnapshotError::invalid_path(&display, "path is outside the root"))?;
        Self::from_relative(relative).map_err(|_| {
            SnapshotError::invalid_path(display, "path cannot be represented in an artifact")
        })
    }

    /// Convert an already-relative host path.
    pub fn from_relative(relative: &Path) -> Result<Self, SnapshotError> {
        let display = relative.display().to_string();
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => {
                    let name = name
                        .to_str()
                        .ok_or_else(|| SnapshotError::invalid_path(&display, "name is not UTF-8"))?;
                    validate_segment(&display, name)?;
                    segments.push(CompactString::new(name));
                }
                Component::CurDir => {}
                _ => {
                    return Err(SnapshotError::invalid_path(
                        display,
                        "path must be relative and stay below the root",
                    ));
                }
            }
        }
        Ok(Self { segments })
    }

    /// Append one segment.
    pub fn join(&self, segment: &str) -> Result<Self, SnapshotError> {
        validate_segment(segment, segment)?;
        let mut segments = self.segments.clone();
        segments.push(CompactString::new(segment));
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[CompactString] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Final segment, if any.
    pub fn basename(&self) -> Option<&str> {
        self.segments.last().map(CompactString::as_str)
    }

    /// Directory prefixes with a trailing `/`: `a/`, `a/b/`, ... up to and
    /// including the full path.
    pub fn dir_prefixes(&self) -> impl Iterator<Item = String> + '_ {
        (1..=self.segments.len()).map(|len| format!("{}/", self.segments[..len].iter().join("/")))
    }

    /// Resolve under a host directory.
    pub fn to_path(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        path.extend(self.segments.iter().map(CompactString::as_str));
        path
    }
}

fn validate_segment(path: &str, segment: &str) -> Result<(), SnapshotError> {
    let reason = if segment.is_empty() {
        "empty path segment"
    } else if segment == "." || segment == ".." {
        "relative segments are not allowed"
    } else if segment.contains('/') {
        "segment contains '/'"
    } else if segment.contains(['\n', '\r']) {
        "segment contains a line break"
    } else if segment.contains('\0') {
        "segment contains a NUL byte"
    } else {
        return Ok(());
    };
    Err(SnapshotError::invalid_path(path, reason))
}

impl std::fmt::Display for RelativePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.iter().join("/"))
    }
}

impl std::str::FromStr for RelativePath {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RelativePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RelativePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
