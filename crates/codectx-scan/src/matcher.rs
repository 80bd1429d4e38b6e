//! Ignore-rule matching.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

use codectx_core::{IgnoreRules, RelativePath, RuleKind, SnapshotError};

/// Compiled ignore rules (and optional include patterns).
///
/// Globs are case-sensitive and `*`/`?` never match `/`. Patterns are
/// anchored at the snapshot root: `build/` only prunes the top-level
/// `build` directory, `**/build/` prunes it at any depth.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    dir_rules: CompiledSet,
    leaf_rules: CompiledSet,
    include: Option<CompiledSet>,
}

impl PatternMatcher {
    /// Compile a rule set.
    pub fn new(rules: &IgnoreRules) -> Result<Self, SnapshotError> {
        Ok(Self {
            dir_rules: CompiledSet::new(rules.of_kind(RuleKind::Directory).map(|r| r.pattern()))?,
            leaf_rules: CompiledSet::new(rules.of_kind(RuleKind::Leaf).map(|r| r.pattern()))?,
            include: None,
        })
    }

    /// Restrict emitted files to those matching one of `patterns`.
    ///
    /// Include patterns use leaf semantics. An empty list keeps every file.
    pub fn with_include<I, S>(mut self, patterns: I) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<S> = patterns.into_iter().collect();
        self.include = if patterns.is_empty() {
            None
        } else {
            Some(CompiledSet::new(patterns.iter().map(|p| p.as_ref()))?)
        };
        Ok(self)
    }

    /// Check whether `path` is excluded by any rule.
    ///
    /// Directory rules are tested against every `prefix/` of the path, leaf
    /// rules against the full path and the basename. The root is never
    /// ignored.
    pub fn is_ignored(&self, path: &RelativePath) -> bool {
        let Some(basename) = path.basename() else {
            return false;
        };

        for prefix in path.dir_prefixes() {
            if let Some(pattern) = self.dir_rules.first_match(&prefix) {
                debug!(path = %path, pattern, "ignoring directory");
                return true;
            }
        }

        let full = path.to_string();
        if let Some(pattern) = self
            .leaf_rules
            .first_match(&full)
            .or_else(|| self.leaf_rules.first_match(basename))
        {
            debug!(path = %path, pattern, "ignoring file");
            return true;
        }

        false
    }

    /// Check whether a file passes the include filter.
    pub fn is_included(&self, path: &RelativePath) -> bool {
        match (&self.include, path.basename()) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(include), Some(basename)) => {
                include.first_match(&path.to_string()).is_some()
                    || include.first_match(basename).is_some()
            }
        }
    }
}

/// Check `path` against `rules` without keeping the compiled matcher.
pub fn matches(path: &RelativePath, rules: &IgnoreRules) -> Result<bool, SnapshotError> {
    Ok(PatternMatcher::new(rules)?.is_ignored(path))
}

/// A glob set that remembers its source patterns for logging.
#[derive(Debug, Clone)]
struct CompiledSet {
    set: GlobSet,
    patterns: Vec<String>,
}

impl CompiledSet {
    fn new<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<Self, SnapshotError> {
        let mut builder = GlobSetBuilder::new();
        let mut sources = Vec::new();
        for pattern in patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .case_insensitive(false)
                .build()
                .map_err(|e| SnapshotError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: e.kind().to_string(),
                })?;
            builder.add(glob);
            sources.push(pattern.to_string());
        }
        let set = builder.build().map_err(|e| SnapshotError::InvalidPattern {
            pattern: sources.join(", "),
            message: e.to_string(),
        })?;
        Ok(Self {
            set,
            patterns: sources,
        })
    }

    fn first_match(&self, candidate: &str) -> Option<&str> {
        self.set
            .matches(candidate)
            .into_iter()
            .min()
            .map(|idx| self.patterns[idx].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(text: &str) -> RelativePath {
        RelativePath::parse(text).unwrap()
    }

    fn matcher(patterns: &[&str]) -> PatternMatcher {
        PatternMatcher::new(&IgnoreRules::from_patterns(patterns.iter().copied())).unwrap()
    }

    #[test]
    fn test_directory_rule_prunes_prefixes() {
        let m = matcher(&["build/"]);
        assert!(m.is_ignored(&path("build")));
        assert!(m.is_ignored(&path("build/out.bin")));
        assert!(m.is_ignored(&path("build/a/b/c.o")));
        assert!(!m.is_ignored(&path("src/build.rs")));
        assert!(!m.is_ignored(&path("builder/x")));
    }

    #[test]
    fn test_directory_rules_are_anchored() {
        let m = matcher(&["build/"]);
        assert!(!m.is_ignored(&path("src/build/x.o")));

        let m = matcher(&["**/build/"]);
        assert!(m.is_ignored(&path("src/build/x.o")));
        assert!(m.is_ignored(&path("build/x.o")));
    }

    #[test]
    fn test_directory_wildcard() {
        let m = matcher(&["bazel-*/"]);
        assert!(m.is_ignored(&path("bazel-out/k8/bin")));
        assert!(!m.is_ignored(&path("src/bazel-out/x")));
    }

    #[test]
    fn test_leaf_rule_basename_and_full_path() {
        let m = matcher(&["*.pyc", "cmake/Cache.cmake", "LICENSE"]);
        assert!(m.is_ignored(&path("a.pyc")));
        assert!(m.is_ignored(&path("pkg/deep/a.pyc")));
        assert!(m.is_ignored(&path("cmake/Cache.cmake")));
        assert!(!m.is_ignored(&path("other/cmake/Cache.cmake")));
        assert!(m.is_ignored(&path("sub/LICENSE")));
        assert!(!m.is_ignored(&path("a.py")));
    }

    #[test]
    fn test_star_does_not_cross_separator() {
        let m = matcher(&["src*"]);
        assert!(m.is_ignored(&path("src")));
        assert!(m.is_ignored(&path("srcfoo")));
        assert!(!m.is_ignored(&path("srcfoo/x")));

        let m = matcher(&["a*.txt"]);
        assert!(!m.is_ignored(&path("a/b.txt")));
        assert!(m.is_ignored(&path("dir/abc.txt")));
    }

    #[test]
    fn test_case_sensitive() {
        let m = matcher(&["README.md"]);
        assert!(m.is_ignored(&path("README.md")));
        assert!(!m.is_ignored(&path("readme.md")));
    }

    #[test]
    fn test_root_never_ignored() {
        let m = matcher(&["*", "*/"]);
        assert!(!m.is_ignored(&RelativePath::root()));
    }

    #[test]
    fn test_leaf_rule_without_slash_matches_directory_name() {
        let m = matcher(&["3rdparty"]);
        assert!(m.is_ignored(&path("3rdparty")));
        assert!(m.is_ignored(&path("libs/3rdparty")));
    }

    #[test]
    fn test_invalid_pattern() {
        let rules = IgnoreRules::from_patterns(["a[".to_string()]);
        let err = PatternMatcher::new(&rules).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidPattern { .. }));
    }

    #[test]
    fn test_include_filter() {
        let m = matcher(&[]).with_include(["*.rs", "docs/*.md"]).unwrap();
        assert!(m.is_included(&path("src/main.rs")));
        assert!(m.is_included(&path("docs/guide.md")));
        assert!(!m.is_included(&path("guide.md")));
        assert!(!m.is_included(&path("Cargo.toml")));

        let m = matcher(&[]).with_include(Vec::<String>::new()).unwrap();
        assert!(m.is_included(&path("anything")));
    }

    #[test]
    fn test_matches_free_function() {
        let mut rules = IgnoreRules::empty();
        assert!(!matches(&path("run.log"), &rules).unwrap());
        rules.add("*.log");
        assert!(matches(&path("run.log"), &rules).unwrap());
    }
}
