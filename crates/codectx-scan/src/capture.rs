//! Snapshot capture: walk, classify and load every included file.

use std::path::Path;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{error, info, warn};

use codectx_core::{
    EntryContent, FileEntry, RelativePath, Snapshot, SnapshotConfig, SnapshotError,
    SnapshotWarning, WarningKind,
};

use crate::walker::TreeWalker;

/// Build an in-memory snapshot of `config.root`.
///
/// Contents are loaded with `config.threads` workers (see [`load_snapshot`]).
/// Unreadable files stay in the snapshot as [`EntryContent::Unreadable`] and
/// are also reported as warnings.
pub fn capture(config: &SnapshotConfig) -> Result<Snapshot, SnapshotError> {
    let walker = TreeWalker::new(config)?;
    info!(root = %walker.root().display(), "capturing snapshot");

    let (paths, warnings) = walker.collect();
    Ok(load_snapshot(walker.root(), paths, warnings, config.threads))
}

/// Load already enumerated `paths` under `root`.
///
/// `threads == 1` reads serially, `0` uses the global rayon pool and any
/// other value a dedicated pool of that size. Entries keep the order of
/// `paths` either way.
pub fn load_snapshot(
    root: &Path,
    paths: Vec<RelativePath>,
    mut warnings: Vec<SnapshotWarning>,
    threads: usize,
) -> Snapshot {
    let entries = load_entries(root, paths, threads);

    for entry in &entries {
        if let EntryContent::Unreadable(cause) = &entry.content {
            let full = entry.path.to_path(root);
            error!(path = %full.display(), "Error reading file: {cause}");
            warnings.push(SnapshotWarning::new(full, cause.clone(), WarningKind::ReadError));
        }
    }

    let snapshot = Snapshot::new(root, entries, warnings);
    info!(
        files = snapshot.len(),
        binary = snapshot.stats.binary_files,
        warnings = snapshot.warnings.len(),
        "snapshot loaded"
    );
    snapshot
}

fn load_entries(root: &Path, paths: Vec<RelativePath>, threads: usize) -> Vec<FileEntry> {
    let load = |path: RelativePath| FileEntry::load(root, path);
    match threads {
        1 => paths.into_iter().map(load).collect(),
        0 => paths.into_par_iter().map(load).collect(),
        n => match ThreadPoolBuilder::new().num_threads(n).build() {
            Ok(pool) => pool.install(|| paths.into_par_iter().map(load).collect()),
            Err(err) => {
                warn!("cannot start {n} loader threads, loading serially: {err}");
                paths.into_iter().map(load).collect()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_capture_classifies_entries() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/a.txt"), "hello").unwrap();
        fs::write(temp.path().join("logo.png"), [0x89u8, b'P', 0, 0]).unwrap();
        fs::write(temp.path().join("bad.txt"), [0xffu8, 0xfe, b'x']).unwrap();

        let snapshot = capture(&SnapshotConfig::new(temp.path())).unwrap();

        assert_eq!(snapshot.len(), 3);
        assert_eq!(
            snapshot.get("src/a.txt").unwrap().content,
            EntryContent::Text("hello".to_string())
        );
        assert_eq!(snapshot.get("logo.png").unwrap().content, EntryContent::Binary);
        assert!(matches!(
            snapshot.get("bad.txt").unwrap().content,
            EntryContent::Unreadable(_)
        ));
        assert_eq!(snapshot.warnings.len(), 1);
        assert_eq!(snapshot.warnings[0].kind, WarningKind::ReadError);
    }

    #[test]
    fn test_parallel_capture_keeps_order() {
        let temp = TempDir::new().unwrap();
        for i in 0..20 {
            fs::write(temp.path().join(format!("f{i:02}.txt")), format!("{i}")).unwrap();
        }

        let serial = capture(&SnapshotConfig::new(temp.path())).unwrap();
        let mut config = SnapshotConfig::new(temp.path());
        config.threads = 0;
        let parallel = capture(&config).unwrap();

        assert_eq!(serial.entries, parallel.entries);
    }

    #[test]
    fn test_sized_pool_loads_in_order() {
        let temp = TempDir::new().unwrap();
        for i in 0..20 {
            fs::write(temp.path().join(format!("f{i:02}.txt")), format!("{i}")).unwrap();
        }
        let paths: Vec<RelativePath> = (0..20)
            .map(|i| RelativePath::parse(&format!("f{i:02}.txt")).unwrap())
            .collect();

        let snapshot = load_snapshot(temp.path(), paths.clone(), Vec::new(), 3);

        assert_eq!(snapshot.paths().cloned().collect::<Vec<_>>(), paths);
        assert_eq!(
            snapshot.get("f07.txt").unwrap().content,
            EntryContent::Text("7".to_string())
        );
        assert!(snapshot.warnings.is_empty());
    }
}
