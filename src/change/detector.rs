// src/change/detector.rs

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::change::cache::FileHashCache;
use crate::change::hash::fingerprint;
use crate::change::path_utils::{relative_str, unix_secs};
use crate::change::walk::{ScanFilter, collect_files};
use crate::fs::FileSystem;

/// Result of one change-detection pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Root-relative paths whose fingerprint differs from the cache.
    pub changed: BTreeSet<String>,
    /// Modification time of the root directory observed by this pass.
    pub root_mtime: Option<f64>,
    /// Number of files fingerprinted (zero on the fast path).
    pub scanned: usize,
    /// True when the scan was skipped because the root did not change.
    pub fast_path: bool,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Computes which files changed since the last run.
///
/// The detector owns the [`FileHashCache`] for the duration of a run; the
/// caller persists it (see [`ChangeDetector::into_cache`]) once the run is
/// over.
#[derive(Debug)]
pub struct ChangeDetector {
    fs: Arc<dyn FileSystem>,
    filter: ScanFilter,
    large_file_bytes: u64,
    cache: FileHashCache,
}

impl ChangeDetector {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        filter: ScanFilter,
        large_file_bytes: u64,
        cache: FileHashCache,
    ) -> Self {
        Self {
            fs,
            filter,
            large_file_bytes,
            cache,
        }
    }

    /// Detect changed files under `root`.
    ///
    /// When `last_scan_mtime` is given and the root directory's mtime is not
    /// newer, the scan is skipped and an empty change set is returned. A
    /// directory mtime only moves when entries are added, removed or renamed
    /// directly in it, so in-place edits (or anything in subdirectories) are
    /// invisible to this shortcut; pass `None` to force a full scan.
    ///
    /// Files that cannot be fingerprinted are reported as changed and their
    /// cache entry is dropped. Entries for files that disappeared are kept.
    pub fn detect_changes(&mut self, root: &Path, last_scan_mtime: Option<f64>) -> Result<ChangeSet> {
        let root_stat = self
            .fs
            .metadata(root)
            .with_context(|| format!("stat project root {:?}", root))?;
        let root_mtime = root_stat.modified.map(unix_secs);

        if let (Some(current), Some(last)) = (root_mtime, last_scan_mtime) {
            if current <= last {
                debug!(current, last, "root unchanged since last scan; skipping");
                return Ok(ChangeSet {
                    changed: BTreeSet::new(),
                    root_mtime: Some(last),
                    scanned: 0,
                    fast_path: true,
                });
            }
        }

        let files = collect_files(self.fs.as_ref(), root, &self.filter)?;
        let mut changed = BTreeSet::new();

        for path in &files {
            let Some(rel) = relative_str(root, path) else {
                continue;
            };

            match fingerprint(self.fs.as_ref(), path, self.large_file_bytes) {
                Ok(fp) => {
                    if self.cache.get(&rel) != Some(fp.as_str()) {
                        debug!(path = %rel, "changed");
                        self.cache.insert(rel.clone(), fp);
                        changed.insert(rel);
                    }
                }
                Err(err) => {
                    warn!(path = %rel, error = %err, "could not fingerprint file; treating as changed");
                    self.cache.invalidate(&rel);
                    changed.insert(rel);
                }
            }
        }

        info!(scanned = files.len(), changed = changed.len(), "change detection finished");

        Ok(ChangeSet {
            changed,
            root_mtime,
            scanned: files.len(),
            fast_path: false,
        })
    }

    pub fn cache(&self) -> &FileHashCache {
        &self.cache
    }

    /// Drop the cached fingerprint for `rel_path`, so the next scan reports
    /// it as changed.
    pub fn forget(&mut self, rel_path: &str) {
        self.cache.invalidate(rel_path);
    }

    pub fn into_cache(self) -> FileHashCache {
        self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn detector(fs: &MockFileSystem) -> ChangeDetector {
        ChangeDetector::new(
            Arc::new(fs.clone()),
            ScanFilter::new(vec![".claude".into()], vec!["node_modules".into()]),
            1_000_000,
            FileHashCache::new(),
        )
    }

    #[test]
    fn first_scan_reports_everything_then_nothing() {
        let fs = MockFileSystem::new();
        fs.add_file("./a.py", "def f(a): pass");
        fs.add_file("./lib/b.py", "import a");

        let mut det = detector(&fs);
        let first = det.detect_changes(Path::new("."), None).unwrap();
        assert_eq!(first.changed.len(), 2);

        let second = det.detect_changes(Path::new("."), None).unwrap();
        assert!(second.is_empty());
        assert_eq!(second.scanned, 2);
    }

    #[test]
    fn fast_path_skips_when_root_is_unchanged() {
        let fs = MockFileSystem::new();
        fs.add_file("./a.py", "x = 1");
        let mut det = detector(&fs);
        let first = det.detect_changes(Path::new("."), None).unwrap();

        fs.modify_file("./a.py", "x = 2");
        let fast = det.detect_changes(Path::new("."), first.root_mtime).unwrap();
        assert!(fast.fast_path);
        assert!(fast.is_empty());

        let full = det.detect_changes(Path::new("."), None).unwrap();
        assert_eq!(full.changed, BTreeSet::from(["a.py".to_string()]));
    }

    #[test]
    fn unreadable_files_are_changed_and_uncached() {
        let fs = MockFileSystem::new();
        fs.add_unreadable_file("./locked.py");
        let mut det = detector(&fs);

        let set = det.detect_changes(Path::new("."), None).unwrap();
        assert!(set.changed.contains("locked.py"));
        assert_eq!(det.cache().get("locked.py"), None);

        let again = det.detect_changes(Path::new("."), None).unwrap();
        assert!(again.changed.contains("locked.py"));
    }

    #[test]
    fn forgotten_files_are_reported_again() {
        let fs = MockFileSystem::new();
        fs.add_file("./a.py", "x = 1");
        fs.add_file("./b.py", "y = 1");
        let mut det = detector(&fs);
        det.detect_changes(Path::new("."), None).unwrap();

        det.forget("a.py");
        let next = det.detect_changes(Path::new("."), None).unwrap();
        assert_eq!(next.changed, BTreeSet::from(["a.py".to_string()]));
    }
}
