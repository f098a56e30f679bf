#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use ripplewatch::config::{ConfigFile, ConfigSection, RawConfigFile, TimeoutSection, WorkerConfig};
use ripplewatch::context::Context;
use tempfile::TempDir;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                timeouts: TimeoutSection::default(),
                worker: Default::default(),
            },
        }
    }

    pub fn with_worker(mut self, name: &str, worker: WorkerConfig) -> Self {
        self.config.worker.insert(name.to_string(), worker);
        self
    }

    pub fn with_default_worker(mut self, name: &str) -> Self {
        self.config.config.default_workers.push(name.to_string());
        self
    }

    pub fn with_exclude(mut self, pattern: &str) -> Self {
        self.config.config.exclude.push(pattern.to_string());
        self
    }

    pub fn with_large_file_bytes(mut self, bytes: u64) -> Self {
        self.config.config.large_file_bytes = bytes;
        self
    }

    pub fn with_small_timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeouts.small_secs = secs;
        self
    }

    pub fn raw(&self) -> &RawConfigFile {
        &self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `WorkerConfig`.
pub struct WorkerConfigBuilder {
    worker: WorkerConfig,
}

impl WorkerConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            worker: WorkerConfig {
                cmd: cmd.to_string(),
                timeout_secs: None,
            },
        }
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.worker.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> WorkerConfig {
        self.worker
    }
}

/// A throwaway project directory.
pub struct ProjectBuilder {
    dir: TempDir,
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp project dir"),
        }
    }

    pub fn file(self, rel: &str, contents: &str) -> Self {
        self.write(rel, contents);
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Create or overwrite a file, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write project file");
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.path(rel)).expect("remove project file");
    }

    /// Context with default locations under this project.
    pub fn context(&self) -> Context {
        Context::for_root(self.root())
    }

    /// Set a file's mtime into the past.
    pub fn age_file(&self, rel: &str, by: Duration) {
        let file = fs::OpenOptions::new()
            .write(true)
            .open(self.path(rel))
            .expect("open file to age");
        let when = SystemTime::now() - by;
        file.set_modified(when).expect("set mtime");
    }
}

impl Default for ProjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}
