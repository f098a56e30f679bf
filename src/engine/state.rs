// src/engine/state.rs

use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::change::path_utils::unix_secs;
use crate::fs::FileSystem;

const PROMPT_EXCERPT_CHARS: usize = 100;

/// State carried from one run to the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorCache {
    /// Unix seconds of the last completed run.
    #[serde(default)]
    pub last_run: Option<f64>,
    /// Root directory mtime seen by the last full scan.
    #[serde(default)]
    pub last_scan_mtime: Option<f64>,
    #[serde(default)]
    pub last_workers: Vec<String>,
    /// Start of the prompt that triggered the last run. Diagnostic only.
    #[serde(default)]
    pub last_prompt: Option<String>,
}

impl OrchestratorCache {
    /// Load from `path`; a missing or corrupt file yields the default.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Self {
        if !fs.exists(path) {
            return Self::default();
        }
        let parsed = fs
            .read_to_string(path)
            .and_then(|text| Ok(serde_json::from_str::<Self>(&text)?));
        match parsed {
            Ok(cache) => cache,
            Err(err) => {
                warn!(path = ?path, error = %err, "orchestrator cache unreadable; using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, fs: &dyn FileSystem, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        fs.write(path, &json)
            .with_context(|| format!("writing orchestrator cache at {:?}", path))?;
        debug!(path = ?path, "stored orchestrator cache");
        Ok(())
    }

    /// Record a finished run.
    pub fn record_run(&mut self, workers: &[String], prompt: Option<&str>) {
        self.last_run = Some(unix_secs(SystemTime::now()));
        self.last_workers = workers.to_vec();
        self.last_prompt = prompt.map(|p| p.chars().take(PROMPT_EXCERPT_CHARS).collect());
    }
}
