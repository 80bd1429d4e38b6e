//! Artifact serialization.

use std::io::{self, Write};
use std::path::Path;

use tracing::{debug, error};

use codectx_core::{ArtifactFormat, EntryContent, FileEntry, RelativePath, Snapshot, SnapshotStats};

use crate::markers::{
    BINARY_SENTINEL, BLOCK_CLOSE, BLOCK_OPEN, CONTENTS_HEADER, CONTENTS_RULE, READ_ERROR_PREFIX,
    TREE_HEADER, TREE_RULE, VERSION_PREFIX,
};

/// Counts reported after writing an artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Per-kind entry counts.
    pub stats: SnapshotStats,
    /// Bytes written to the sink.
    pub bytes_written: u64,
}

/// Serializes snapshots into the artifact text layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotWriter {
    format: ArtifactFormat,
}

impl SnapshotWriter {
    pub fn new(format: ArtifactFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> ArtifactFormat {
        self.format
    }

    /// Write an already loaded snapshot.
    pub fn write<W: Write>(&self, snapshot: &Snapshot, sink: W) -> io::Result<WriteSummary> {
        let mut sink = CountingWriter::new(sink);
        let mut stats = SnapshotStats::new();

        self.write_tree(snapshot.paths(), &mut sink)?;
        for entry in &snapshot.entries {
            stats.record(&entry.content);
            self.write_block(entry, &mut sink)?;
        }
        sink.flush()?;

        Ok(WriteSummary {
            stats,
            bytes_written: sink.count,
        })
    }

    /// Load and write `files` under `root` one at a time.
    ///
    /// A file that cannot be read becomes an `Error reading file:` block; the
    /// rest of the artifact is still written. Only sink failures are errors.
    pub fn write_files<W: Write>(
        &self,
        root: &Path,
        files: &[RelativePath],
        sink: W,
    ) -> io::Result<WriteSummary> {
        let mut sink = CountingWriter::new(sink);
        let mut stats = SnapshotStats::new();

        self.write_tree(files.iter(), &mut sink)?;
        for path in files {
            let entry = FileEntry::load(root, path.clone());
            if let EntryContent::Unreadable(cause) = &entry.content {
                error!(path = %path.to_path(root).display(), "Error reading file: {cause}");
            }
            stats.record(&entry.content);
            self.write_block(&entry, &mut sink)?;
        }
        sink.flush()?;

        Ok(WriteSummary {
            stats,
            bytes_written: sink.count,
        })
    }

    fn write_tree<'a, W: Write>(
        &self,
        paths: impl Iterator<Item = &'a RelativePath>,
        sink: &mut W,
    ) -> io::Result<()> {
        if self.format != ArtifactFormat::Legacy {
            writeln!(sink, "{VERSION_PREFIX}{}", self.format.version())?;
        }
        sink.write_all(TREE_HEADER.as_bytes())?;
        sink.write_all(TREE_RULE.as_bytes())?;
        for path in paths {
            writeln!(sink, "{path}")?;
        }
        sink.write_all(b"\n\n")?;
        sink.write_all(CONTENTS_HEADER.as_bytes())?;
        sink.write_all(CONTENTS_RULE.as_bytes())?;
        Ok(())
    }

    fn write_block<W: Write>(&self, entry: &FileEntry, sink: &mut W) -> io::Result<()> {
        let payload = render_payload(&entry.content);
        match self.format {
            ArtifactFormat::Legacy => {
                write!(sink, "\n{BLOCK_OPEN}{}{BLOCK_CLOSE}\n", entry.path)?;
            }
            ArtifactFormat::Framed => {
                write!(
                    sink,
                    "\n{BLOCK_OPEN}{}{BLOCK_CLOSE} {}\n",
                    entry.path,
                    payload.len()
                )?;
            }
        }
        sink.write_all(payload.as_bytes())?;
        sink.write_all(b"\n")?;
        debug!(path = %entry.path, bytes = payload.len(), "wrote block");
        Ok(())
    }
}

/// The exact payload stored for an entry.
///
/// Text is verbatim; binary and unreadable entries become a single line.
pub fn render_payload(content: &EntryContent) -> std::borrow::Cow<'_, str> {
    match content {
        EntryContent::Text(text) => text.as_str().into(),
        EntryContent::Binary => format!("{BINARY_SENTINEL}\n").into(),
        EntryContent::Unreadable(cause) => format!("{READ_ERROR_PREFIX}{cause}\n").into(),
    }
}

struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, content: EntryContent) -> FileEntry {
        FileEntry::new(RelativePath::parse(path).unwrap(), content)
    }

    fn render(format: ArtifactFormat, entries: Vec<FileEntry>) -> String {
        let snapshot = Snapshot::new("/src", entries, Vec::new());
        let mut out = Vec::new();
        let summary = SnapshotWriter::new(format).write(&snapshot, &mut out).unwrap();
        assert_eq!(summary.bytes_written, out.len() as u64);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_legacy_layout_is_exact() {
        let text = render(
            ArtifactFormat::Legacy,
            vec![
                entry("src/a.txt", EntryContent::Text("hello".into())),
                entry("img.png", EntryContent::Binary),
                entry("bad.txt", EntryContent::Unreadable("invalid utf-8".into())),
            ],
        );

        let expected = "Directory Tree:\n\
                        ===============\n\
                        src/a.txt\n\
                        img.png\n\
                        bad.txt\n\
                        \n\
                        \n\
                        File Contents:\n\
                        ==============\n\
                        \n\
                        --- src/a.txt ---\n\
                        hello\n\
                        \n\
                        --- img.png ---\n\
                        [Binary file, content not displayed]\n\
                        \n\
                        \n\
                        --- bad.txt ---\n\
                        Error reading file: invalid utf-8\n\
                        \n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_empty_snapshot() {
        let text = render(ArtifactFormat::Legacy, Vec::new());
        assert_eq!(
            text,
            "Directory Tree:\n===============\n\n\nFile Contents:\n==============\n"
        );
    }

    #[test]
    fn test_framed_layout() {
        let text = render(
            ArtifactFormat::Framed,
            vec![entry("notes.txt", EntryContent::Text("a\n--- x ---\n".into()))],
        );
        assert_eq!(
            text,
            "Snapshot-Format: 2\n\
             Directory Tree:\n\
             ===============\n\
             notes.txt\n\
             \n\
             \n\
             File Contents:\n\
             ==============\n\
             \n\
             --- notes.txt --- 12\n\
             a\n--- x ---\n\
             \n"
        );
    }

    #[test]
    fn test_summary_counts() {
        let snapshot = Snapshot::new(
            "/src",
            vec![
                entry("a", EntryContent::Text("abc".into())),
                entry("b", EntryContent::Binary),
            ],
            Vec::new(),
        );
        let summary = SnapshotWriter::default().write(&snapshot, io::sink()).unwrap();
        assert_eq!(summary.stats.text_files, 1);
        assert_eq!(summary.stats.binary_files, 1);
        assert_eq!(summary.stats.text_bytes, 3);
    }
}
