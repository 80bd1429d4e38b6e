//! File content classification and loading.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::path::RelativePath;

/// Number of leading bytes inspected by [`classify`].
pub const BINARY_PROBE_LEN: usize = 1024;

/// Whether a file's bytes are embedded or replaced by a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    Text,
    Binary,
}

/// Classify a file by looking for a NUL byte in its first
/// [`BINARY_PROBE_LEN`] bytes.
///
/// UTF-16 text is reported as binary and binary files without an early NUL
/// as text; the heuristic is kept as-is for artifact compatibility.
pub fn classify(path: &Path) -> std::io::Result<ContentKind> {
    let file = File::open(path)?;
    let mut probe = Vec::with_capacity(BINARY_PROBE_LEN);
    file.take(BINARY_PROBE_LEN as u64).read_to_end(&mut probe)?;
    Ok(classify_bytes(&probe))
}

/// Classify an in-memory prefix.
pub fn classify_bytes(bytes: &[u8]) -> ContentKind {
    let probe = &bytes[..bytes.len().min(BINARY_PROBE_LEN)];
    if probe.contains(&0) {
        ContentKind::Binary
    } else {
        ContentKind::Text
    }
}

/// Loaded content of a snapshot entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryContent {
    /// UTF-8 text, byte-for-byte.
    Text(String),
    /// Binary file; the bytes are not carried.
    Binary,
    /// A text file that could not be read or decoded.
    Unreadable(String),
}

impl EntryContent {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Binary => ContentKind::Binary,
            Self::Text(_) | Self::Unreadable(_) => ContentKind::Text,
        }
    }
}

/// One file of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the snapshot root.
    pub path: RelativePath,
    /// Classified content.
    pub content: EntryContent,
}

impl FileEntry {
    /// Create an entry from already-loaded content.
    pub fn new(path: RelativePath, content: EntryContent) -> Self {
        Self { path, content }
    }

    /// Classify and read `path` under `root`.
    ///
    /// Never fails: a classification error falls through to the text read,
    /// and a failed read is recorded as [`EntryContent::Unreadable`].
    pub fn load(root: &Path, path: RelativePath) -> Self {
        let full = path.to_path(root);
        let content = match classify(&full) {
            Ok(ContentKind::Binary) => EntryContent::Binary,
            Ok(ContentKind::Text) | Err(_) => match std::fs::read_to_string(&full) {
                Ok(text) => EntryContent::Text(text),
                Err(err) => EntryContent::Unreadable(err.to_string()),
            },
        };
        Self { path, content }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_classify_bytes() {
        assert_eq!(classify_bytes(b"hello world"), ContentKind::Text);
        assert_eq!(classify_bytes(b"ab\0cd"), ContentKind::Binary);
        assert_eq!(classify_bytes(b""), ContentKind::Text);

        // A NUL past the probe window is not seen.
        let mut late = vec![b'a'; BINARY_PROBE_LEN];
        late.push(0);
        assert_eq!(classify_bytes(&late), ContentKind::Text);
    }

    #[test]
    fn test_classify_file() {
        let temp = TempDir::new().unwrap();
        let text = temp.path().join("a.txt");
        let bin = temp.path().join("b.bin");
        fs::write(&text, "plain").unwrap();
        fs::write(&bin, [1u8, 2, 0, 4]).unwrap();

        assert_eq!(classify(&text).unwrap(), ContentKind::Text);
        assert_eq!(classify(&bin).unwrap(), ContentKind::Binary);
        assert!(classify(&temp.path().join("missing")).is_err());
    }

    #[test]
    fn test_load_entry() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "hello").unwrap();
        fs::write(temp.path().join("latin1.txt"), [0xe9u8, b'a']).unwrap();

        let entry = FileEntry::load(temp.path(), RelativePath::parse("a.txt").unwrap());
        assert_eq!(entry.content, EntryContent::Text("hello".to_string()));

        let entry = FileEntry::load(temp.path(), RelativePath::parse("latin1.txt").unwrap());
        assert!(matches!(entry.content, EntryContent::Unreadable(_)));
        assert_eq!(entry.content.kind(), ContentKind::Text);

        let entry = FileEntry::load(temp.path(), RelativePath::parse("gone.txt").unwrap());
        assert!(matches!(entry.content, EntryContent::Unreadable(_)));
    }
}
