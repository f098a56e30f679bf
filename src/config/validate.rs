// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{RippleError, Result, is_valid_worker_name};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RippleError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.timeouts, raw.worker))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_scan_config(cfg)?;
    validate_timeouts(cfg)?;
    validate_workers(cfg)?;
    Ok(())
}

fn validate_scan_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.large_file_bytes == 0 {
        return Err(RippleError::ConfigError(
            "[config].large_file_bytes must be >= 1 (got 0)".to_string(),
        ));
    }

    for dir in &cfg.config.allowed_dot_dirs {
        if !dir.starts_with('.') {
            return Err(RippleError::ConfigError(format!(
                "[config].allowed_dot_dirs entry '{}' must start with '.'",
                dir
            )));
        }
    }

    for pat in &cfg.config.exclude {
        globset::Glob::new(pat).map_err(|e| {
            RippleError::ConfigError(format!("invalid exclude glob '{}': {}", pat, e))
        })?;
    }

    Ok(())
}

fn validate_timeouts(cfg: &RawConfigFile) -> Result<()> {
    let t = &cfg.timeouts;

    if t.small_secs == 0 || t.medium_secs == 0 || t.large_secs == 0 {
        return Err(RippleError::ConfigError(
            "[timeouts] budgets must all be >= 1 second".to_string(),
        ));
    }

    if t.medium_threshold >= t.large_threshold {
        return Err(RippleError::ConfigError(format!(
            "[timeouts].medium_threshold ({}) must be below large_threshold ({})",
            t.medium_threshold, t.large_threshold
        )));
    }

    Ok(())
}

fn validate_workers(cfg: &RawConfigFile) -> Result<()> {
    for (name, worker) in cfg.worker.iter() {
        if !is_valid_worker_name(name) {
            return Err(RippleError::InvalidWorkerName(name.clone()));
        }
        if worker.cmd.trim().is_empty() {
            return Err(RippleError::ConfigError(format!(
                "worker '{}' has an empty `cmd`",
                name
            )));
        }
        if worker.timeout_secs == Some(0) {
            return Err(RippleError::ConfigError(format!(
                "worker '{}' has timeout_secs = 0",
                name
            )));
        }
    }

    for name in &cfg.config.default_workers {
        if !cfg.worker.contains_key(name) {
            return Err(RippleError::ConfigError(format!(
                "[config].default_workers names unknown worker '{}'",
                name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<ConfigFile> {
        let raw: RawConfigFile = toml::from_str(toml_src)?;
        ConfigFile::try_from(raw)
    }

    #[test]
    fn empty_config_is_valid_and_uses_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.config_section().stale_lock_secs, 600);
        assert_eq!(cfg.config_section().large_file_bytes, 1_000_000);
        assert!(cfg.workers().is_empty());
    }

    #[test]
    fn default_workers_must_be_configured() {
        let err = parse(
            r#"
[config]
default_workers = ["ghost"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RippleError::ConfigError(msg) if msg.contains("ghost")));
    }

    #[test]
    fn worker_names_are_checked() {
        let err = parse(
            r#"
[worker."bad name"]
cmd = "true"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RippleError::InvalidWorkerName(_)));
    }

    #[test]
    fn timeout_thresholds_must_be_ordered() {
        let err = parse(
            r#"
[timeouts]
medium_threshold = 80
large_threshold = 40
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RippleError::ConfigError(msg) if msg.contains("medium_threshold")));
    }

    #[test]
    fn default_worker_names_fall_back_to_all_workers() {
        let cfg = parse(
            r#"
[worker.docs]
cmd = "echo docs"

[worker.tidy]
cmd = "echo tidy"
timeout_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(cfg.default_worker_names(), vec!["docs", "tidy"]);
        assert_eq!(cfg.workers()["tidy"].timeout_secs, Some(5));
    }
}
