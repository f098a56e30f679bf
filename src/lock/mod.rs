// src/lock/mod.rs

//! Cross-process named locks backed by advisory file locks.
//!
//! Each name maps to `<lock_dir>/<name>.lock`. Holding the lock means
//! holding an exclusive `flock` on that file; the file's contents
//! ([`LockRecord`]) are informational. A record without a live holder is
//! stale and may be removed by [`NamedLock::reclaim_stale`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, UNIX_EPOCH};

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::errors::{Result, RippleError, is_valid_worker_name};

mod record;

pub use record::LockRecord;

/// Interval between attempts under [`WaitPolicy::Bounded`].
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

const LOCK_EXTENSION: &str = "lock";

/// How long `acquire` may wait for a contended lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    NonBlocking,
    Bounded(Duration),
}

/// Directory of named lock records.
#[derive(Debug, Clone)]
pub struct NamedLock {
    dir: PathBuf,
}

/// A held lock. Dropping the guard releases it.
#[derive(Debug)]
pub struct LockGuard {
    name: String,
    path: PathBuf,
    file: Option<File>,
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == fs2::lock_contended_error().kind()
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// The open handle and the path still name the same file. Fails when the
/// record was unlinked (released by its holder) between open and lock.
#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (file.metadata(), fs::metadata(path)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn still_linked(_file: &File, path: &Path) -> bool {
    path.exists()
}

impl NamedLock {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `name`. Names are restricted to
    /// `[A-Za-z0-9_-]+` so they can never escape the lock directory.
    pub fn record_path(&self, name: &str) -> Result<PathBuf> {
        if !is_valid_worker_name(name) {
            return Err(RippleError::InvalidWorkerName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.{LOCK_EXTENSION}")))
    }

    /// Try to take the lock for `name`.
    ///
    /// Returns `Ok(None)` when another holder has it (after waiting, for
    /// [`WaitPolicy::Bounded`]). Errors are I/O failures other than
    /// contention.
    pub fn acquire(&self, name: &str, policy: WaitPolicy) -> Result<Option<LockGuard>> {
        let path = self.record_path(name)?;
        let deadline = match policy {
            WaitPolicy::NonBlocking => None,
            WaitPolicy::Bounded(timeout) => Some(Instant::now() + timeout),
        };

        loop {
            if let Some(guard) = self.try_acquire_at(name, &path)? {
                return Ok(Some(guard));
            }
            let Some(deadline) = deadline else {
                debug!(lock = name, "lock contended");
                return Ok(None);
            };
            let now = Instant::now();
            if now >= deadline {
                debug!(lock = name, "gave up waiting for lock");
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    pub fn try_acquire(&self, name: &str) -> Result<Option<LockGuard>> {
        self.acquire(name, WaitPolicy::NonBlocking)
    }

    fn try_acquire_at(&self, name: &str, path: &Path) -> Result<Option<LockGuard>> {
        fs::create_dir_all(&self.dir)?;

        // A holder may unlink the record between our open and our lock; the
        // retry reopens the fresh path.
        for _ in 0..3 {
            let mut file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)?;

            match file.try_lock_exclusive() {
                Ok(()) => {}
                Err(err) if is_contended(&err) => return Ok(None),
                Err(err) => {
                    return Err(RippleError::LockError {
                        name: name.to_string(),
                        reason: err.to_string(),
                    });
                }
            }

            if !still_linked(&file, path) {
                let _ = FileExt::unlock(&file);
                continue;
            }

            let record = LockRecord::for_current_process();
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(record.render().as_bytes())?;
            file.flush()?;

            debug!(lock = name, pid = record.pid, "lock acquired");
            return Ok(Some(LockGuard {
                name: name.to_string(),
                path: path.to_path_buf(),
                file: Some(file),
            }));
        }

        Ok(None)
    }

    /// Whether a live process holds `name`.
    ///
    /// A record on disk is not enough: this probes with a non-blocking lock
    /// and releases it immediately if it succeeds.
    pub fn is_held(&self, name: &str) -> bool {
        let Ok(path) = self.record_path(name) else {
            return false;
        };
        let Ok(file) = File::open(&path) else {
            return false;
        };
        match file.try_lock_exclusive() {
            Ok(()) => {
                let _ = FileExt::unlock(&file);
                false
            }
            Err(err) => is_contended(&err),
        }
    }

    /// Contents of the record for `name`, if one exists and parses.
    pub fn read_record(&self, name: &str) -> Option<LockRecord> {
        let path = self.record_path(name).ok()?;
        LockRecord::parse(&fs::read_to_string(path).ok()?)
    }

    /// Remove records that no live process holds and that are older than
    /// `max_age`. Returns the reclaimed names.
    ///
    /// Each record is deleted while the probe lock is held, so a process
    /// cannot acquire it between the check and the delete. Records whose
    /// contents don't parse are aged by file mtime.
    pub fn reclaim_stale(&self, max_age: Duration) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(dir = ?self.dir, error = %err, "cannot list lock directory");
                }
                return Vec::new();
            }
        };

        let now = record::now_ms();
        let mut reclaimed = Vec::new();

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LOCK_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            let Ok(mut file) = File::open(&path) else {
                continue;
            };
            if file.try_lock_exclusive().is_err() {
                debug!(lock = %name, "lock is live; not reclaiming");
                continue;
            }

            let mut text = String::new();
            let age = match file.read_to_string(&mut text).ok().and_then(|_| LockRecord::parse(&text)) {
                Some(rec) => Some(rec.age_at(now)),
                None => file
                    .metadata()
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
                    .map(|m| Duration::from_millis(now.saturating_sub(m.as_millis() as u64))),
            };

            if age.is_some_and(|age| age > max_age) && still_linked(&file, &path) {
                match fs::remove_file(&path) {
                    Ok(()) => {
                        info!(lock = %name, "reclaimed stale lock");
                        reclaimed.push(name);
                    }
                    Err(err) => warn!(lock = %name, error = %err, "failed to remove stale lock"),
                }
            }
            let _ = FileExt::unlock(&file);
        }

        reclaimed.sort();
        reclaimed
    }
}

impl LockGuard {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock and remove its record.
    pub fn release(mut self) -> Result<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        // Unlink while still locked so no waiter locks a doomed inode.
        let removed = match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        };
        let unlocked = FileExt::unlock(&file);
        debug!(lock = %self.name, "lock released");
        removed?;
        unlocked?;
        Ok(())
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(err) = self.release_inner() {
            warn!(lock = %self.name, error = %err, "failed to release lock cleanly");
        }
    }
}
