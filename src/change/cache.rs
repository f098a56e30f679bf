// src/change/cache.rs

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::fs::FileSystem;

/// Persisted map of relative path -> content fingerprint.
///
/// On disk this is one `path fingerprint` pair per line. Fingerprints never
/// contain whitespace, so the split happens at the last space and paths with
/// spaces survive a round trip.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileHashCache {
    hashes: BTreeMap<String, String>,
}

impl FileHashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cache from `path`.
    ///
    /// A missing file yields an empty cache. An unreadable or malformed file
    /// is reported and also yields an empty cache, which simply makes the
    /// next scan treat everything as changed.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Self {
        if !fs.exists(path) {
            debug!(path = ?path, "no hash cache yet");
            return Self::new();
        }

        match fs.read_to_string(path) {
            Ok(text) => match Self::parse(&text) {
                Some(cache) => {
                    debug!(path = ?path, entries = cache.len(), "loaded hash cache");
                    cache
                }
                None => {
                    warn!(path = ?path, "hash cache is malformed; starting from empty");
                    Self::new()
                }
            },
            Err(err) => {
                warn!(path = ?path, error = %err, "failed to read hash cache; starting from empty");
                Self::new()
            }
        }
    }

    fn parse(text: &str) -> Option<Self> {
        let mut hashes = BTreeMap::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let (name, hash) = line.rsplit_once(' ')?;
            if name.is_empty() || hash.is_empty() {
                return None;
            }
            hashes.insert(name.to_string(), hash.to_string());
        }
        Some(Self { hashes })
    }

    /// Persist the cache to `path`, creating parent directories as needed.
    pub fn save(&self, fs: &dyn FileSystem, path: &Path) -> Result<()> {
        let mut out = String::new();
        for (name, hash) in &self.hashes {
            out.push_str(name);
            out.push(' ');
            out.push_str(hash);
            out.push('\n');
        }
        fs.write(path, out.as_bytes())
            .with_context(|| format!("writing hash cache at {:?}", path))?;
        info!(path = ?path, entries = self.hashes.len(), "stored hash cache");
        Ok(())
    }

    pub fn get(&self, rel_path: &str) -> Option<&str> {
        self.hashes.get(rel_path).map(String::as_str)
    }

    pub fn insert(&mut self, rel_path: impl Into<String>, fingerprint: impl Into<String>) {
        self.hashes.insert(rel_path.into(), fingerprint.into());
    }

    /// Drop the entry for a file (e.g. after a failed read).
    pub fn invalidate(&mut self, rel_path: &str) {
        if self.hashes.remove(rel_path).is_some() {
            debug!(path = rel_path, "invalidated cached fingerprint");
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.hashes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn paths_with_spaces_survive_save_and_load() {
        let fs = MockFileSystem::new();
        let mut cache = FileHashCache::new();
        cache.insert("docs/my notes.md", "abc123");
        cache.insert("src/a.py", "def456");
        cache.save(&fs, Path::new("./cache/file_hashes")).unwrap();

        let loaded = FileHashCache::load(&fs, Path::new("./cache/file_hashes"));
        assert_eq!(loaded, cache);
        assert_eq!(loaded.get("docs/my notes.md"), Some("abc123"));
    }

    #[test]
    fn malformed_cache_resets_to_empty() {
        let fs = MockFileSystem::new();
        fs.add_file("./file_hashes", "src/a.py abc\nnot-a-pair\n");
        assert!(FileHashCache::load(&fs, Path::new("./file_hashes")).is_empty());
    }

    #[test]
    fn unreadable_cache_resets_to_empty() {
        let fs = MockFileSystem::new();
        fs.add_unreadable_file("./file_hashes");
        assert!(FileHashCache::load(&fs, Path::new("./file_hashes")).is_empty());
    }
}
