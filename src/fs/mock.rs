// src/fs/mock.rs

use super::{FileStat, FileSystem};
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File {
        content: Vec<u8>,
        modified: SystemTime,
        unreadable: bool,
    },
    Dir {
        children: Vec<String>,
        modified: SystemTime,
    },
}

/// In-memory filesystem for tests.
///
/// Modification times come from a logical clock that advances by one second
/// on every mutation, so tests never depend on the wall clock. Adding an
/// entry bumps its parent directory's mtime, like a real filesystem does.
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    clock: Arc<AtomicU64>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let clock = Arc::new(AtomicU64::new(1_000_000));
        let mut files = HashMap::new();
        files.insert(
            PathBuf::from("."),
            MockEntry::Dir {
                children: Vec::new(),
                modified: UNIX_EPOCH + Duration::from_secs(clock.load(Ordering::SeqCst)),
            },
        );

        Self {
            files: Arc::new(Mutex::new(files)),
            clock,
        }
    }

    fn tick(&self) -> SystemTime {
        let secs = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.insert_file(path.as_ref(), content.into(), false);
    }

    /// Add a file that exists in listings but fails every read.
    pub fn add_unreadable_file(&self, path: impl AsRef<Path>) {
        self.insert_file(path.as_ref(), Vec::new(), true);
    }

    /// Overwrite a file's content without touching its parent directory.
    pub fn modify_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let now = self.tick();
        let mut files = self.entries();
        files.insert(
            path.as_ref().to_path_buf(),
            MockEntry::File {
                content: content.into(),
                modified: now,
                unreadable: false,
            },
        );
    }

    /// Bump a directory's mtime (as creating/removing an entry would).
    pub fn touch_dir(&self, path: impl AsRef<Path>) {
        let now = self.tick();
        let mut files = self.entries();
        if let Some(MockEntry::Dir { modified, .. }) = files.get_mut(path.as_ref()) {
            *modified = now;
        }
    }

    fn insert_file(&self, path: &Path, content: Vec<u8>, unreadable: bool) {
        let now = self.tick();
        let mut files = self.entries();
        files.insert(
            path.to_path_buf(),
            MockEntry::File {
                content,
                modified: now,
                unreadable,
            },
        );

        if let Some(parent) = path.parent() {
            let parent = normalize_parent(parent);
            Self::ensure_dir_entry(&mut files, parent, now);
            Self::add_child(&mut files, parent, path, now);
        }
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path, now: SystemTime) {
        if files.contains_key(path) {
            return;
        }
        files.insert(
            path.to_path_buf(),
            MockEntry::Dir {
                children: Vec::new(),
                modified: now,
            },
        );
        if let Some(parent) = path.parent() {
            let parent = normalize_parent(parent);
            if parent != path {
                Self::ensure_dir_entry(files, parent, now);
                Self::add_child(files, parent, path, now);
            }
        }
    }

    fn add_child(files: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path, now: SystemTime) {
        if let Some(MockEntry::Dir { children, modified }) = files.get_mut(parent) {
            if let Some(name) = child.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                    *modified = now;
                }
            }
        }
    }

    fn readable_content(&self, path: &Path) -> Result<Vec<u8>> {
        let files = self.entries();
        match files.get(path) {
            Some(MockEntry::File {
                unreadable: true, ..
            }) => Err(anyhow!("Permission denied: {:?}", path)),
            Some(MockEntry::File { content, .. }) => Ok(content.clone()),
            Some(MockEntry::Dir { .. }) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }
}

fn normalize_parent(parent: &Path) -> &Path {
    if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let content = self.readable_content(path)?;
        String::from_utf8(content).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let content = self.readable_content(path)?;
        Ok(Box::new(Cursor::new(content)))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.entries().get(path), Some(MockEntry::File { .. }))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entries().get(path), Some(MockEntry::Dir { .. }))
    }

    fn metadata(&self, path: &Path) -> Result<FileStat> {
        match self.entries().get(path) {
            Some(MockEntry::File {
                content, modified, ..
            }) => Ok(FileStat {
                len: content.len() as u64,
                modified: Some(*modified),
                is_dir: false,
            }),
            Some(MockEntry::Dir { modified, .. }) => Ok(FileStat {
                len: 0,
                modified: Some(*modified),
                is_dir: true,
            }),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match self.entries().get(path) {
            Some(MockEntry::Dir { children, .. }) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_a_file_bumps_parent_mtime_but_modifying_does_not() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/a.py", "x = 1");
        let before = fs.metadata(Path::new("./src")).unwrap().modified;

        fs.modify_file("./src/a.py", "x = 2");
        assert_eq!(fs.metadata(Path::new("./src")).unwrap().modified, before);

        fs.add_file("./src/b.py", "y = 1");
        assert!(fs.metadata(Path::new("./src")).unwrap().modified > before);
    }

    #[test]
    fn unreadable_files_are_listed_but_fail_reads() {
        let fs = MockFileSystem::new();
        fs.add_unreadable_file("./secret.txt");
        assert!(fs.is_file(Path::new("./secret.txt")));
        assert!(fs.read_to_string(Path::new("./secret.txt")).is_err());
        assert_eq!(fs.read_dir(Path::new(".")).unwrap(), vec![PathBuf::from("./secret.txt")]);
    }
}
