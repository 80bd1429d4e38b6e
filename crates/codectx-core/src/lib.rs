//! Core types and configuration for codectx.
//!
//! This crate provides the data model shared by the scanner, the artifact
//! codec and the reconstructor: relative paths, ignore rules, file entries,
//! snapshots, configuration and error types.

mod config;
mod content;
mod error;
mod path;
mod rules;
mod snapshot;

pub use config::{ArtifactFormat, SnapshotConfig, SnapshotConfigBuilder};
pub use content::{BINARY_PROBE_LEN, ContentKind, EntryContent, FileEntry, classify, classify_bytes};
pub use error::{FormatError, SnapshotError, SnapshotWarning, WarningKind};
pub use path::RelativePath;
pub use rules::{DEFAULT_IGNORE_PATTERNS, IgnoreRule, IgnoreRules, RuleKind};
pub use snapshot::{Snapshot, SnapshotStats};
