// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Raw configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// graph_path = "Documents/Technical/dependency_graph.json"
/// stale_lock_secs = 600
/// default_workers = ["docs"]
///
/// [timeouts]
/// small_secs = 60
///
/// [worker.docs]
/// cmd = "make docs"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Paths and scan behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Tiered per-worker timeout budget from `[timeouts]`.
    #[serde(default)]
    pub timeouts: TimeoutSection,

    /// All workers from `[worker.<name>]`.
    #[serde(default)]
    pub worker: BTreeMap<String, WorkerConfig>,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`)
/// or `ConfigFile::default()`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    config: ConfigSection,
    timeouts: TimeoutSection,
    worker: BTreeMap<String, WorkerConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        timeouts: TimeoutSection,
        worker: BTreeMap<String, WorkerConfig>,
    ) -> Self {
        Self {
            config,
            timeouts,
            worker,
        }
    }

    pub fn config_section(&self) -> &ConfigSection {
        &self.config
    }

    pub fn timeouts(&self) -> &TimeoutSection {
        &self.timeouts
    }

    pub fn workers(&self) -> &BTreeMap<String, WorkerConfig> {
        &self.worker
    }

    /// Workers to request when none were named on the command line.
    pub fn default_worker_names(&self) -> Vec<String> {
        if self.config.default_workers.is_empty() {
            self.worker.keys().cloned().collect()
        } else {
            self.config.default_workers.clone()
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Directory holding the hash cache and orchestrator cache.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Directory holding one `<worker>.lock` record per worker.
    #[serde(default = "default_lock_dir")]
    pub lock_dir: String,

    /// Location of the persisted dependency graph.
    #[serde(default = "default_graph_path")]
    pub graph_path: String,

    /// Lock records older than this (and not held) are removed.
    #[serde(default = "default_stale_lock_secs")]
    pub stale_lock_secs: u64,

    /// Files above this size are fingerprinted by `(size, mtime)` instead of
    /// by content.
    #[serde(default = "default_large_file_bytes")]
    pub large_file_bytes: u64,

    /// Dot-directories that are scanned anyway.
    #[serde(default = "default_allowed_dot_dirs")]
    pub allowed_dot_dirs: Vec<String>,

    /// Directory names that are never scanned (dependency managers, build
    /// caches).
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,

    /// Extra glob patterns (relative to the root) excluded from scanning.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Workers requested when none are given on the command line.
    #[serde(default)]
    pub default_workers: Vec<String>,
}

fn default_cache_dir() -> String {
    ".ripplewatch/cache".to_string()
}

fn default_lock_dir() -> String {
    ".ripplewatch/locks".to_string()
}

fn default_graph_path() -> String {
    "Documents/Technical/dependency_graph.json".to_string()
}

fn default_stale_lock_secs() -> u64 {
    600
}

fn default_large_file_bytes() -> u64 {
    1_000_000
}

fn default_allowed_dot_dirs() -> Vec<String> {
    vec![".claude".to_string()]
}

fn default_ignored_dirs() -> Vec<String> {
    ["node_modules", "__pycache__", "target", "venv", "dist", "build"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            lock_dir: default_lock_dir(),
            graph_path: default_graph_path(),
            stale_lock_secs: default_stale_lock_secs(),
            large_file_bytes: default_large_file_bytes(),
            allowed_dot_dirs: default_allowed_dot_dirs(),
            ignored_dirs: default_ignored_dirs(),
            exclude: Vec::new(),
            default_workers: Vec::new(),
        }
    }
}

/// `[timeouts]` section.
///
/// Larger change volume gets a larger per-worker budget:
///
/// - fewer than `medium_threshold` changed files: `small_secs`
/// - fewer than `large_threshold`: `medium_secs`
/// - otherwise: `large_secs`
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutSection {
    #[serde(default = "default_small_secs")]
    pub small_secs: u64,
    #[serde(default = "default_medium_secs")]
    pub medium_secs: u64,
    #[serde(default = "default_large_secs")]
    pub large_secs: u64,
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: usize,
    #[serde(default = "default_large_threshold")]
    pub large_threshold: usize,
}

fn default_small_secs() -> u64 {
    60
}

fn default_medium_secs() -> u64 {
    120
}

fn default_large_secs() -> u64 {
    180
}

fn default_medium_threshold() -> usize {
    10
}

fn default_large_threshold() -> usize {
    50
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            small_secs: default_small_secs(),
            medium_secs: default_medium_secs(),
            large_secs: default_large_secs(),
            medium_threshold: default_medium_threshold(),
            large_threshold: default_large_threshold(),
        }
    }
}

/// `[worker.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Shell command run in the project root.
    pub cmd: String,

    /// Fixed timeout for this worker, overriding the tiered budget.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}
