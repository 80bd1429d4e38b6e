//! Snapshot container and statistics.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::content::{EntryContent, FileEntry};
use crate::error::SnapshotWarning;
use crate::path::RelativePath;

/// Summary counts for a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStats {
    /// Entries embedded as text.
    pub text_files: u64,
    /// Entries replaced by the binary sentinel.
    pub binary_files: u64,
    /// Text entries that failed to read.
    pub unreadable_files: u64,
    /// Total bytes of embedded text.
    pub text_bytes: u64,
}

impl SnapshotStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with an entry.
    pub fn record(&mut self, content: &EntryContent) {
        match content {
            EntryContent::Text(text) => {
                self.text_files += 1;
                self.text_bytes += text.len() as u64;
            }
            EntryContent::Binary => self.binary_files += 1,
            EntryContent::Unreadable(_) => self.unreadable_files += 1,
        }
    }

    pub fn total_files(&self) -> u64 {
        self.text_files + self.binary_files + self.unreadable_files
    }
}

/// An enumerated, loaded directory tree ready for serialization.
///
/// Entries keep enumeration order and their paths are unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Root the entries are relative to.
    pub root: PathBuf,
    /// Entries in enumeration order.
    pub entries: Vec<FileEntry>,
    /// Summary statistics.
    pub stats: SnapshotStats,
    /// Non-fatal problems hit while building the snapshot.
    pub warnings: Vec<SnapshotWarning>,
}

impl Snapshot {
    /// Create a snapshot from loaded entries.
    pub fn new(
        root: impl Into<PathBuf>,
        entries: Vec<FileEntry>,
        warnings: Vec<SnapshotWarning>,
    ) -> Self {
        let mut stats = SnapshotStats::new();
        for entry in &entries {
            stats.record(&entry.content);
        }
        Self {
            root: root.into(),
            entries,
            stats,
            warnings,
        }
    }

    /// Paths in enumeration order.
    pub fn paths(&self) -> impl Iterator<Item = &RelativePath> {
        self.entries.iter().map(|entry| &entry.path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its `/`-joined path.
    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|entry| entry.path.to_string() == path)
    }
}
