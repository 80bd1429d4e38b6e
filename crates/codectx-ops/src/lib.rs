//! Reconstruction of directory trees from codectx artifacts.
//!
//! [`restore`] reads an artifact, parses it completely and only then starts
//! touching the destination, so a malformed artifact leaves no partial tree
//! behind.

mod reconstruct;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use codectx_core::FormatError;
use codectx_format::read_artifact;

pub use reconstruct::{ReconstructReport, Reconstructor};

/// Fatal reconstruction errors. Per-path failures are reported in
/// [`ReconstructReport`] instead.
#[derive(Debug, Error)]
pub enum ReconstructError {
    /// Destination exists and is not a directory.
    #[error("Destination is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The artifact or destination could not be accessed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact is malformed.
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl ReconstructError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Parse the artifact at `artifact` and rebuild its files under `dest`.
pub fn restore(artifact: &Path, dest: &Path) -> Result<ReconstructReport, ReconstructError> {
    info!(artifact = %artifact.display(), "parsing artifact");
    let text = std::fs::read_to_string(artifact).map_err(|e| ReconstructError::io(artifact, e))?;
    let parsed = read_artifact(&text)?;
    info!(
        files = parsed.files.len(),
        format = ?parsed.format,
        dest = %dest.display(),
        "writing files"
    );
    Reconstructor::new(dest).reconstruct_parsed(&parsed)
}
