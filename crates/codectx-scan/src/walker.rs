//! JWalk-based tree enumeration with ignore-rule pruning.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use jwalk::{DirEntry, Parallelism, WalkDir};
use tracing::{debug, warn};

use codectx_core::{RelativePath, SnapshotConfig, SnapshotError, SnapshotWarning, WarningKind};

use crate::matcher::PatternMatcher;

type Entry = Result<DirEntry<((), ())>, jwalk::Error>;

/// Enumerates the files of a root directory that survive the ignore rules.
///
/// Order is pre-order: within each directory its files come first, then
/// its subdirectories are descended, both sorted by byte-wise name. The
/// order does not depend on the thread count. Unfollowed symlinks to
/// regular files are listed under their own name.
pub struct TreeWalker {
    root: PathBuf,
    matcher: Arc<PatternMatcher>,
    follow_symlinks: bool,
    threads: usize,
}

impl TreeWalker {
    /// Create a walker from a snapshot config.
    ///
    /// Fails if a pattern does not compile or the root is not a directory.
    pub fn new(config: &SnapshotConfig) -> Result<Self, SnapshotError> {
        let matcher = PatternMatcher::new(&config.ignore)?.with_include(&config.include_patterns)?;
        let mut walker = Self::with_matcher(&config.root, matcher)?;
        walker.follow_symlinks = config.follow_symlinks;
        walker.threads = config.threads;
        Ok(walker)
    }

    /// Create a serial walker with an already compiled matcher.
    pub fn with_matcher(root: &Path, matcher: PatternMatcher) -> Result<Self, SnapshotError> {
        let root = root.canonicalize().map_err(|e| SnapshotError::io(root, e))?;
        if !root.is_dir() {
            return Err(SnapshotError::NotADirectory { path: root });
        }
        Ok(Self {
            root,
            matcher: Arc::new(matcher),
            follow_symlinks: false,
            threads: 1,
        })
    }

    /// Canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a lazy walk. The returned iterator is single-use and reflects
    /// the filesystem as it is read.
    pub fn walk(&self) -> Walk {
        let parallelism = match self.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            1 => Parallelism::Serial,
            n => Parallelism::RayonNewPool(n),
        };

        let root = self.root.clone();
        let matcher = Arc::clone(&self.matcher);

        let walker = WalkDir::new(&self.root)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(self.follow_symlinks)
            .min_depth(1)
            .process_read_dir(move |_depth, dir, _state, children| {
                prune_children(&root, dir, &matcher, children);
            });

        Walk {
            root: self.root.clone(),
            inner: Box::new(walker.into_iter()),
        }
    }

    /// Run a walk to completion, splitting paths from warnings.
    pub fn collect(&self) -> (Vec<RelativePath>, Vec<SnapshotWarning>) {
        let mut paths = Vec::new();
        let mut warnings = Vec::new();
        for item in self.walk() {
            match item {
                Ok(path) => paths.push(path),
                Err(warning) => warnings.push(warning),
            }
        }
        (paths, warnings)
    }
}

/// Drop ignored children before jwalk descends into them, then fix the
/// emission order.
fn prune_children(root: &Path, dir: &Path, matcher: &PatternMatcher, children: &mut Vec<Entry>) {
    // Unrepresentable directories are kept so the walk can report them.
    let Ok(parent) = RelativePath::from_path(root, dir) else {
        return;
    };

    children.retain_mut(|child| {
        let Ok(entry) = child else {
            return true;
        };
        let path = entry.file_name.to_str().map(|name| parent.join(name));
        let Some(Ok(path)) = path else {
            // Reported by the walk; nothing below it could be named either.
            entry.read_children_path = None;
            return true;
        };
        if matcher.is_ignored(&path) {
            return false;
        }
        entry.file_type.is_dir() || matcher.is_included(&path)
    });

    children.sort_by(|a, b| match (a, b) {
        (Ok(a), Ok(b)) => a
            .file_type
            .is_dir()
            .cmp(&b.file_type.is_dir())
            .then_with(|| a.file_name.cmp(&b.file_name)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => Ordering::Equal,
    });
}

/// Lazy sequence of included files, or warnings for entries that could
/// not be read or represented.
pub struct Walk {
    root: PathBuf,
    inner: Box<dyn Iterator<Item = Entry>>,
}

impl Iterator for Walk {
    type Item = Result<RelativePath, SnapshotWarning>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(walk_warning(&err, PathBuf::new()))),
            };

            let file_type = entry.file_type();
            let full = entry.path();

            if file_type.is_dir() {
                if RelativePath::from_path(&self.root, &full).is_err() {
                    let warning = SnapshotWarning::new(
                        &full,
                        "Directory name cannot be represented in an artifact",
                        WarningKind::InvalidPath,
                    );
                    warn!(path = %full.display(), "skipping directory");
                    return Some(Err(warning));
                }
                if let Some(err) = entry.read_children_error.take() {
                    return Some(Err(walk_warning(&err, full)));
                }
                continue;
            }

            if file_type.is_symlink() {
                // Unfollowed links are listed under their own name when they
                // point at a regular file.
                match std::fs::metadata(&full) {
                    Ok(target) if target.is_file() => {}
                    Ok(_) => {
                        debug!(path = %full.display(), "skipping link to non-regular file");
                        continue;
                    }
                    Err(err) => {
                        warn!(path = %full.display(), "broken symbolic link: {err}");
                        return Some(Err(SnapshotWarning::new(
                            &full,
                            format!("Broken symbolic link: {err}"),
                            WarningKind::Skipped,
                        )));
                    }
                }
            } else if !file_type.is_file() {
                debug!(path = %full.display(), "skipping non-regular file");
                continue;
            }

            return Some(match RelativePath::from_path(&self.root, &full) {
                Ok(path) => {
                    debug!(path = %path, "added file");
                    Ok(path)
                }
                Err(err) => {
                    warn!(path = %full.display(), "{err}");
                    Err(SnapshotWarning::new(full, err.to_string(), WarningKind::InvalidPath))
                }
            });
        }
    }
}

/// Turn a traversal error into a warning, logging it.
fn walk_warning(err: &jwalk::Error, fallback: PathBuf) -> SnapshotWarning {
    let path = err.path().map(Path::to_path_buf).unwrap_or(fallback);
    let warning = match err.io_error() {
        Some(io) => SnapshotWarning::read_error(path, io),
        None => SnapshotWarning::new(path, err.to_string(), WarningKind::ReadError),
    };
    warn!(path = %warning.path.display(), "{}", warning.message);
    warning
}
