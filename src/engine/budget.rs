// src/engine/budget.rs

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::ConfigFile;
use crate::config::TimeoutSection;

/// Tiered per-worker timeout, chosen by change volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBudget {
    small: Duration,
    medium: Duration,
    large: Duration,
    medium_threshold: usize,
    large_threshold: usize,
}

impl Default for TimeoutBudget {
    fn default() -> Self {
        Self::from(&TimeoutSection::default())
    }
}

impl From<&TimeoutSection> for TimeoutBudget {
    fn from(section: &TimeoutSection) -> Self {
        Self {
            small: Duration::from_secs(section.small_secs),
            medium: Duration::from_secs(section.medium_secs),
            large: Duration::from_secs(section.large_secs),
            medium_threshold: section.medium_threshold,
            large_threshold: section.large_threshold,
        }
    }
}

impl TimeoutBudget {
    /// Budget for a run that changed `changed_files` files.
    pub fn for_change_volume(&self, changed_files: usize) -> Duration {
        if changed_files < self.medium_threshold {
            self.small
        } else if changed_files < self.large_threshold {
            self.medium
        } else {
            self.large
        }
    }
}

/// Resolved timeout for every worker of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetPlan {
    default: Duration,
    overrides: BTreeMap<String, Duration>,
}

impl BudgetPlan {
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            default: timeout,
            overrides: BTreeMap::new(),
        }
    }

    /// Tiered budget for `changed_files`, with fixed `timeout_secs` from
    /// `[worker.<name>]` taking precedence.
    pub fn from_config(cfg: &ConfigFile, changed_files: usize) -> Self {
        let default = TimeoutBudget::from(cfg.timeouts()).for_change_volume(changed_files);
        let overrides = cfg
            .workers()
            .iter()
            .filter_map(|(name, w)| w.timeout_secs.map(|s| (name.clone(), Duration::from_secs(s))))
            .collect();
        Self { default, overrides }
    }

    pub fn with_override(mut self, worker: impl Into<String>, timeout: Duration) -> Self {
        self.overrides.insert(worker.into(), timeout);
        self
    }

    pub fn for_worker(&self, name: &str) -> Duration {
        self.overrides.get(name).copied().unwrap_or(self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RawConfigFile, WorkerConfig};

    #[test]
    fn tiers_grow_with_change_volume() {
        let budget = TimeoutBudget::default();
        assert_eq!(budget.for_change_volume(0), Duration::from_secs(60));
        assert_eq!(budget.for_change_volume(9), Duration::from_secs(60));
        assert_eq!(budget.for_change_volume(10), Duration::from_secs(120));
        assert_eq!(budget.for_change_volume(49), Duration::from_secs(120));
        assert_eq!(budget.for_change_volume(50), Duration::from_secs(180));
    }

    #[test]
    fn worker_timeouts_override_the_tier() {
        let mut raw = RawConfigFile::default();
        raw.worker.insert(
            "docs".into(),
            WorkerConfig {
                cmd: "true".into(),
                timeout_secs: Some(7),
            },
        );
        raw.worker.insert(
            "tidy".into(),
            WorkerConfig {
                cmd: "true".into(),
                timeout_secs: None,
            },
        );
        let cfg = ConfigFile::try_from(raw).unwrap();
        let plan = BudgetPlan::from_config(&cfg, 12);
        assert_eq!(plan.for_worker("docs"), Duration::from_secs(7));
        assert_eq!(plan.for_worker("tidy"), Duration::from_secs(120));
    }
}
