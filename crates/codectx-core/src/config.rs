//! Snapshot configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::rules::IgnoreRules;

/// Artifact layout written by the producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// Version 1: marker-delimited blocks, no escaping.
    #[default]
    Legacy,
    /// Version 2: length-framed blocks behind a version header.
    Framed,
}

impl ArtifactFormat {
    /// Numeric format version.
    pub fn version(self) -> u32 {
        match self {
            Self::Legacy => 1,
            Self::Framed => 2,
        }
    }

    /// Look up a format by version number.
    pub fn from_version(version: u32) -> Option<Self> {
        match version {
            1 => Some(Self::Legacy),
            2 => Some(Self::Framed),
            _ => None,
        }
    }
}

/// Configuration for producing a snapshot.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SnapshotConfig {
    /// Root directory to snapshot.
    pub root: PathBuf,

    /// Rules excluding paths from the snapshot.
    #[builder(default)]
    #[serde(default)]
    pub ignore: IgnoreRules,

    /// When non-empty, only files matching one of these leaf patterns are kept.
    #[builder(default)]
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Follow symbolic links instead of skipping them.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Worker threads (1 = serial, 0 = rayon default pool).
    #[builder(default = "1")]
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Artifact layout to write.
    #[builder(default)]
    #[serde(default)]
    pub format: ArtifactFormat,
}

fn default_threads() -> usize {
    1
}

impl SnapshotConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl SnapshotConfig {
    /// Create a new config builder.
    pub fn builder() -> SnapshotConfigBuilder {
        SnapshotConfigBuilder::default()
    }

    /// Create a config with default rules for a root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore: IgnoreRules::default(),
            include_patterns: Vec::new(),
            follow_symlinks: false,
            threads: 1,
            format: ArtifactFormat::Legacy,
        }
    }

    /// Parse a TOML config document.
    pub fn from_toml_str(text: &str) -> Result<Self, SnapshotError> {
        let config: Self = toml::from_str(text).map_err(|e| SnapshotError::InvalidConfig {
            message: e.to_string(),
        })?;
        if config.root.as_os_str().is_empty() {
            return Err(SnapshotError::InvalidConfig {
                message: "Root path cannot be empty".to_string(),
            });
        }
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn from_toml_file(path: &Path) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path).map_err(|e| SnapshotError::io(path, e))?;
        Self::from_toml_str(&text)
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
