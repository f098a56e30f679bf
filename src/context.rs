// src/context.rs

//! Locations every component works against.
//!
//! Built once per run from the project root and the `[config]` section and
//! passed to each component, so a test can point the whole engine at a
//! temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::change::path_utils::relative_str;
use crate::config::ConfigSection;

const HASH_CACHE_FILE: &str = "file_hashes";
const ORCHESTRATOR_CACHE_FILE: &str = "orchestrator_cache.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    root: PathBuf,
    cache_dir: PathBuf,
    lock_dir: PathBuf,
    graph_path: PathBuf,
}

fn under(root: &Path, p: &str) -> PathBuf {
    let p = Path::new(p);
    if p.is_absolute() { p.to_path_buf() } else { root.join(p) }
}

impl Context {
    pub fn new(root: impl Into<PathBuf>, section: &ConfigSection) -> Self {
        let root = root.into();
        Self {
            cache_dir: under(&root, &section.cache_dir),
            lock_dir: under(&root, &section.lock_dir),
            graph_path: under(&root, &section.graph_path),
            root,
        }
    }

    /// Context with default locations under `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self::new(root, &ConfigSection::default())
    }

    /// Create the cache and lock directories and the graph's parent.
    pub fn init(&self) -> Result<()> {
        for dir in [Some(self.cache_dir.as_path()), Some(self.lock_dir.as_path()), self.graph_path.parent()]
            .into_iter()
            .flatten()
        {
            fs::create_dir_all(dir).with_context(|| format!("creating directory {:?}", dir))?;
        }
        debug!(root = ?self.root, "context initialised");
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn lock_dir(&self) -> &Path {
        &self.lock_dir
    }

    pub fn graph_path(&self) -> &Path {
        &self.graph_path
    }

    pub fn hash_cache_path(&self) -> PathBuf {
        self.cache_dir.join(HASH_CACHE_FILE)
    }

    pub fn orchestrator_cache_path(&self) -> PathBuf {
        self.cache_dir.join(ORCHESTRATOR_CACHE_FILE)
    }

    /// Root-relative paths of everything this tool writes inside the root;
    /// the scanner must never treat them as project files.
    pub fn owned_paths(&self) -> Vec<String> {
        [&self.cache_dir, &self.lock_dir, &self.graph_path]
            .into_iter()
            .filter_map(|p| relative_str(&self.root, p))
            .filter(|rel| !rel.is_empty() && !rel.starts_with(".."))
            .collect()
    }
}
