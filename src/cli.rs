// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `ripplewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ripplewatch",
    version,
    about = "Report the structural impact of changed files and run background maintenance workers.",
    long_about = None
)]
pub struct CliArgs {
    /// Project root to analyse.
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: String,

    /// Path to the config file (TOML).
    ///
    /// Default: `Ripplewatch.toml` inside the project root. A missing file
    /// means "use defaults".
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Worker to run after analysis (repeatable).
    ///
    /// If omitted, `default_workers` from the config is used, or every
    /// configured worker when that list is empty.
    #[arg(long = "worker", value_name = "NAME")]
    pub workers: Vec<String>,

    /// Skip worker dispatch entirely; only analyse and report.
    #[arg(long)]
    pub no_workers: bool,

    /// Ignore the root-mtime shortcut and walk the whole tree.
    #[arg(long)]
    pub full_scan: bool,

    /// Free-form request text, kept (truncated) in the orchestrator cache.
    #[arg(long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RIPPLEWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Analyse and print the plan, but don't run workers or write caches.
    #[arg(long)]
    pub dry_run: bool,

    /// Only remove stale lock records, then exit.
    #[arg(long)]
    pub reclaim_locks_only: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_worker_flags_are_collected_in_order() {
        let args = CliArgs::parse_from([
            "ripplewatch",
            "proj",
            "--worker",
            "docs",
            "--worker",
            "tidy",
            "--full-scan",
        ]);
        assert_eq!(args.root, "proj");
        assert_eq!(args.workers, vec!["docs", "tidy"]);
        assert!(args.full_scan);
        assert!(!args.dry_run);
    }

    #[test]
    fn root_defaults_to_current_dir() {
        let args = CliArgs::parse_from(["ripplewatch"]);
        assert_eq!(args.root, ".");
        assert!(args.config.is_none());
    }
}
