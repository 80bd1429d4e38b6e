//! Ignore rule sets.

use std::io::BufRead;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;

/// Patterns excluded from every snapshot unless the caller retracts them.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".gitignore",
    ".git/",
    ".cache/",
    ".ccls/",
    "build/",
    ".vscode/",
    ".session/",
    "*.pyc",
    "__pycache__/",
    "*.log",
    "*.tmp",
    "venv/",
    "compile_commands.json",
    // bazel
    "bazel-*/",
    "external/",
    // vendored code
    "third_party/",
    "Resources/",
    "LICENSE",
    ".gitmodules",
    "README.md",
    ".clang-format",
    ".cmake-format.yaml",
    "cmake/StaticAnalyzers.cmake",
    "cmake/PreventInSourceBuilds.cmake",
    "cmake/Cache.cmake",
    "cmake/Conan.cmake",
    "cmake/Sanitizers.cmake",
    "cmake/StandardProjectSettings.cmake",
    "cmake/Doxygen.cmake",
    "cmake/CompilerWarnings.cmake",
    "3rdparty",
];

/// How a pattern is applied to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKind {
    /// Pattern ends with `/` and is tested against every directory prefix.
    Directory,
    /// Pattern is tested against the full relative path and the basename.
    Leaf,
}

impl RuleKind {
    /// Classify a pattern by its shape.
    pub fn of(pattern: &str) -> Self {
        if pattern.ends_with('/') {
            Self::Directory
        } else {
            Self::Leaf
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory => f.pad("dir"),
            Self::Leaf => f.pad("leaf"),
        }
    }
}

/// A single ignore pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IgnoreRule(String);

impl IgnoreRule {
    /// Create a rule from a pattern string.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// The raw pattern.
    pub fn pattern(&self) -> &str {
        &self.0
    }

    /// Directory or leaf rule.
    pub fn kind(&self) -> RuleKind {
        RuleKind::of(&self.0)
    }
}

/// An ordered, caller-owned set of ignore rules.
///
/// `add` never rejects duplicates and `remove` of an absent pattern is a
/// no-op, so both are safe to call repeatedly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IgnoreRules {
    rules: Vec<IgnoreRule>,
}

impl IgnoreRules {
    /// A rule set with no patterns.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Build a rule set from patterns.
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rules: patterns.into_iter().map(IgnoreRule::new).collect(),
        }
    }

    /// Append a pattern.
    pub fn add(&mut self, pattern: impl Into<String>) {
        self.rules.push(IgnoreRule::new(pattern));
    }

    /// Remove every occurrence of a pattern.
    pub fn remove(&mut self, pattern: &str) {
        self.rules.retain(|rule| rule.pattern() != pattern);
    }

    /// Check whether a pattern is present.
    pub fn contains(&self, pattern: &str) -> bool {
        self.rules.iter().any(|rule| rule.pattern() == pattern)
    }

    /// Iterate over the rules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &IgnoreRule> {
        self.rules.iter()
    }

    /// Iterate over rules of one kind.
    pub fn of_kind(&self, kind: RuleKind) -> impl Iterator<Item = &IgnoreRule> {
        self.rules.iter().filter(move |rule| rule.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Add patterns from an ignore file: one per line, `#` starts a comment
    /// line, blank lines are skipped.
    pub fn extend_from_reader(&mut self, reader: impl BufRead) -> std::io::Result<usize> {
        let mut added = 0;
        for line in reader.lines() {
            let line = line?;
            let pattern = line.trim();
            if pattern.is_empty() || pattern.starts_with('#') {
                continue;
            }
            self.add(pattern);
            added += 1;
        }
        Ok(added)
    }

    /// Add patterns from an ignore file on disk.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, SnapshotError> {
        let file = std::fs::File::open(path).map_err(|e| SnapshotError::io(path, e))?;
        self.extend_from_reader(std::io::BufReader::new(file))
            .map_err(|e| SnapshotError::io(path, e))
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::from_patterns(DEFAULT_IGNORE_PATTERNS.iter().copied())
    }
}

impl<'a> IntoIterator for &'a IgnoreRules {
    type Item = &'a IgnoreRule;
    type IntoIter = std::slice::Iter<'a, IgnoreRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
