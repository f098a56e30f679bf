// src/change/walk.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::change::path_utils::relative_str;
use crate::config::ConfigSection;
use crate::fs::FileSystem;

/// Decides which paths under the project root take part in a scan.
///
/// A path is skipped when any of its components:
/// - starts with `.` and is not an allow-listed dot directory, or
/// - names an ignored build/dependency directory,
///
/// or when its relative path matches an exclude glob or one of the
/// tool's own output locations.
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    allowed_dot_dirs: Vec<String>,
    ignored_dirs: Vec<String>,
    exclude: Option<GlobSet>,
    skip_paths: Vec<String>,
}

impl ScanFilter {
    pub fn new(allowed_dot_dirs: Vec<String>, ignored_dirs: Vec<String>) -> Self {
        Self {
            allowed_dot_dirs,
            ignored_dirs,
            exclude: None,
            skip_paths: Vec::new(),
        }
    }

    /// Build a filter from the `[config]` section.
    pub fn from_config(section: &ConfigSection) -> Result<Self> {
        let mut filter = Self::new(
            section.allowed_dot_dirs.clone(),
            section.ignored_dirs.clone(),
        );
        if !section.exclude.is_empty() {
            filter.exclude = Some(build_globset(&section.exclude)?);
        }
        Ok(filter)
    }

    /// Never scan `rel_path` (or anything below it).
    pub fn with_skip_path(mut self, rel_path: impl Into<String>) -> Self {
        let rel = rel_path.into();
        let rel = rel.trim_end_matches('/').to_string();
        if !rel.is_empty() {
            self.skip_paths.push(rel);
        }
        self
    }

    fn component_ignored(&self, name: &str) -> bool {
        if name.starts_with('.') {
            return !self.allowed_dot_dirs.iter().any(|d| d == name);
        }
        self.ignored_dirs.iter().any(|d| d == name)
    }

    /// Whether a root-relative, slash-separated path should be skipped.
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        if rel_path.split('/').any(|part| self.component_ignored(part)) {
            return true;
        }
        if self
            .skip_paths
            .iter()
            .any(|skip| rel_path == skip || rel_path.starts_with(&format!("{skip}/")))
        {
            return true;
        }
        self.exclude
            .as_ref()
            .is_some_and(|set| set.is_match(rel_path))
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Collect every file under `root` that passes `filter`.
///
/// The root itself must be listable. Subdirectories that cannot be listed
/// are logged and skipped so one bad directory never aborts the scan.
pub fn collect_files(fs: &dyn FileSystem, root: &Path, filter: &ScanFilter) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if dir == root => return Err(err),
            Err(err) => {
                warn!(dir = ?dir, error = %err, "skipping unreadable directory");
                continue;
            }
        };

        for path in entries {
            let Some(rel) = relative_str(root, &path) else {
                continue;
            };
            if filter.is_ignored(&rel) {
                debug!(path = %rel, "ignored");
                continue;
            }
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
