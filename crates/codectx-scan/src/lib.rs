//! Ignore-rule matching and tree enumeration for codectx.
//!
//! # Overview
//!
//! `codectx-scan` decides which files of a directory tree belong in a
//! snapshot:
//!
//! - **Pattern matching** via globset, with directory rules tested against
//!   every path prefix and leaf rules against the full path and basename
//! - **Pruned traversal** via jwalk; ignored directories are never read
//! - **Deterministic order**: files first, then subdirectories, by name
//!
//! # Example
//!
//! ```rust,no_run
//! use codectx_scan::{SnapshotConfig, TreeWalker};
//!
//! let mut config = SnapshotConfig::new("/path/to/project");
//! config.ignore.add("*.log");
//!
//! let walker = TreeWalker::new(&config).unwrap();
//! for item in walker.walk() {
//!     match item {
//!         Ok(path) => println!("{path}"),
//!         Err(warning) => eprintln!("skipped {warning}"),
//!     }
//! }
//! ```

mod capture;
mod matcher;
mod walker;

pub use capture::{capture, load_snapshot};
pub use matcher::{PatternMatcher, matches};
pub use walker::{TreeWalker, Walk};

// Re-export core types for convenience
pub use codectx_core::{
    FileEntry, IgnoreRules, RelativePath, Snapshot, SnapshotConfig, SnapshotError,
    SnapshotWarning, WarningKind,
};
