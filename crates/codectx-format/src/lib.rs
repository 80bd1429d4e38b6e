//! Artifact writer and reader for codectx snapshots.
//!
//! An artifact is a single text file: a tree section listing every included
//! path, followed by one content block per path.
//!
//! ```text
//! Directory Tree:
//! ===============
//! src/a.txt
//!
//!
//! File Contents:
//! ==============
//!
//! --- src/a.txt ---
//! hello
//! ```
//!
//! Two layouts exist. [`ArtifactFormat::Legacy`] (version 1) is the layout
//! above, byte for byte. [`ArtifactFormat::Framed`] (version 2) starts with a
//! `Snapshot-Format: 2` line and appends each payload's byte length to its
//! header (`--- src/a.txt --- 5`), which makes block boundaries unambiguous.
//! [`read_artifact`] accepts both.

mod markers;
mod reader;
mod writer;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::info;

use codectx_core::{SnapshotConfig, SnapshotError, SnapshotWarning};
use codectx_scan::{TreeWalker, load_snapshot};

pub use markers::{BINARY_SENTINEL, READ_ERROR_PREFIX, VERSION_PREFIX};
pub use reader::{ParsedArtifact, read_artifact, read_legacy};
pub use writer::{SnapshotWriter, WriteSummary, render_payload};

pub use codectx_core::{ArtifactFormat, FormatError};

/// Outcome of [`produce`].
#[derive(Debug, Clone)]
pub struct ProduceSummary {
    /// Number of files written to the artifact.
    pub files: usize,
    /// Writer counts.
    pub write: WriteSummary,
    /// Paths skipped during enumeration.
    pub warnings: Vec<SnapshotWarning>,
}

/// Snapshot `config.root` into an artifact at `output`.
///
/// Fails before creating `output` if the source is not a directory or a
/// pattern is invalid. Unreadable paths are skipped with a warning and
/// unreadable file contents become error blocks.
///
/// With `config.threads == 1` files are read one at a time while the
/// artifact is written. Otherwise all contents are loaded in parallel
/// first and written in enumeration order.
pub fn produce(config: &SnapshotConfig, output: &Path) -> Result<ProduceSummary, SnapshotError> {
    let walker = TreeWalker::new(config)?;
    info!(source = %walker.root().display(), "enumerating files");

    let (files, warnings) = walker.collect();
    info!(files = files.len(), skipped = warnings.len(), "enumeration finished");

    let file_count = files.len();
    let sink = File::create(output).map_err(|e| SnapshotError::io(output, e))?;
    let sink = BufWriter::new(sink);
    let writer = SnapshotWriter::new(config.format);
    info!(output = %output.display(), format = ?config.format, "writing artifact");

    let written = if config.threads == 1 {
        writer.write_files(walker.root(), &files, sink)
    } else {
        let snapshot = load_snapshot(walker.root(), files, Vec::new(), config.threads);
        writer.write(&snapshot, sink)
    };
    let write = written.map_err(|e| SnapshotError::io(output, e))?;

    Ok(ProduceSummary {
        files: file_count,
        write,
        warnings,
    })
}
