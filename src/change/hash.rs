// src/change/hash.rs

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Compute the blake3 hash of a single file, streaming its contents.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Fingerprint a file for change detection.
///
/// Files up to `large_file_bytes` are content hashed. Larger files are
/// fingerprinted as `"{size}_{mtime_nanos}"` so they are never read in full;
/// a content change that preserves both size and mtime goes unnoticed.
pub fn fingerprint(fs: &dyn FileSystem, path: &Path, large_file_bytes: u64) -> Result<String> {
    let stat = fs
        .metadata(path)
        .with_context(|| format!("stat for fingerprint: {:?}", path))?;

    if stat.len > large_file_bytes {
        let mtime = stat
            .modified
            .and_then(|m| m.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        debug!(path = ?path, size = stat.len, "large file, using size/mtime fingerprint");
        return Ok(format!("{}_{}", stat.len, mtime));
    }

    compute_file_hash(fs, path)
}
