// src/lib.rs

pub mod analysis;
pub mod change;
pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod extract;
pub mod fs;
pub mod graph;
pub mod lock;
pub mod logging;
pub mod types;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisOutcome, analyse_changes};
use crate::change::{ChangeDetector, ChangeSet, FileHashCache, ScanFilter};
use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, load_or_default};
use crate::context::Context;
use crate::engine::{
    BudgetPlan, DispatchContext, OrchestratorCache, Scheduler, WorkerName, WorkerReport,
};
use crate::exec::{CommandInvoker, SUBPROCESS_ENV_VAR, WorkerInvoker};
use crate::fs::{FileSystem, RealFileSystem};
use crate::graph::DependencyGraphStore;
use crate::lock::{NamedLock, WaitPolicy};

/// Lock guarding load/merge/save of the dependency graph across processes.
pub const GRAPH_LOCK_NAME: &str = "_graph";

const GRAPH_LOCK_WAIT: Duration = Duration::from_secs(5);

/// Per-run switches, usually taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Workers to dispatch; empty means "use the config's defaults".
    pub workers: Vec<String>,
    pub no_workers: bool,
    pub full_scan: bool,
    pub prompt: Option<String>,
    pub dry_run: bool,
}

impl From<&CliArgs> for RunOptions {
    fn from(args: &CliArgs) -> Self {
        Self {
            workers: args.workers.clone(),
            no_workers: args.no_workers,
            full_scan: args.full_scan,
            prompt: args.prompt.clone(),
            dry_run: args.dry_run,
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub reclaimed_locks: Vec<String>,
    pub changes: ChangeSet,
    pub analysis: AnalysisOutcome,
    /// Workers that would be (or were) requested.
    pub planned_workers: Vec<String>,
    pub reports: BTreeMap<WorkerName, WorkerReport>,
}

/// High-level entry point used by `main.rs`.
///
/// Resolves the root and config, runs the pipeline against the real
/// filesystem and prints the report plus one line per worker.
pub async fn run(args: CliArgs) -> Result<()> {
    let root = resolve_root(Path::new(&args.root));
    let config_path = args
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| default_config_path(&root));
    let cfg = load_or_default(&config_path);
    let ctx = Arc::new(Context::new(&root, cfg.config_section()));
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    if args.reclaim_locks_only {
        let stale = Duration::from_secs(cfg.config_section().stale_lock_secs);
        for name in NamedLock::new(ctx.lock_dir()).reclaim_stale(stale) {
            println!("reclaimed stale lock: {name}");
        }
        return Ok(());
    }

    let mut opts = RunOptions::from(&args);
    if std::env::var_os(SUBPROCESS_ENV_VAR).is_some() {
        debug!("running inside a worker; not dispatching workers");
        opts.no_workers = true;
    }

    let invoker: Arc<dyn WorkerInvoker> = Arc::new(CommandInvoker::new(cfg.workers().clone()));
    let summary = run_pipeline(ctx, &cfg, fs, invoker, &opts).await?;

    println!("{}", scan_summary(&summary.changes));
    println!("{}", summary.analysis.assessment.report);
    if opts.dry_run && !summary.planned_workers.is_empty() {
        println!("would run: {}", summary.planned_workers.join(", "));
    }
    for report in summary.reports.values() {
        println!(
            "worker {}: {} ({:.1}s)",
            report.name,
            report.outcome,
            report.elapsed.as_secs_f64()
        );
    }
    Ok(())
}

/// Header line of the printed report.
fn scan_summary(changes: &ChangeSet) -> String {
    if changes.fast_path {
        "Scanned 0 file(s): project root unchanged since last scan".to_string()
    } else {
        format!(
            "Scanned {} file(s), {} changed",
            changes.scanned,
            changes.changed.len()
        )
    }
}

fn resolve_root(root: &Path) -> PathBuf {
    root.canonicalize().unwrap_or_else(|_| root.to_path_buf())
}

/// Detect, analyse, dispatch and persist.
///
/// Failures in any stage are logged and degrade that stage only; the
/// returned error is reserved for a root that cannot be scanned at all.
pub async fn run_pipeline(
    ctx: Arc<Context>,
    cfg: &ConfigFile,
    fs: Arc<dyn FileSystem>,
    invoker: Arc<dyn WorkerInvoker>,
    opts: &RunOptions,
) -> Result<RunSummary> {
    let section = cfg.config_section();
    if !opts.dry_run {
        if let Err(err) = ctx.init() {
            warn!(error = %err, "could not create working directories");
        }
    }

    let scheduler = Scheduler::new(Arc::clone(&ctx), Arc::clone(&fs));
    let reclaimed_locks = if opts.dry_run {
        Vec::new()
    } else {
        scheduler
            .locks()
            .reclaim_stale(Duration::from_secs(section.stale_lock_secs))
    };

    let mut orchestrator = OrchestratorCache::load(fs.as_ref(), &ctx.orchestrator_cache_path());
    let hashes = FileHashCache::load(fs.as_ref(), &ctx.hash_cache_path());

    let mut filter = ScanFilter::from_config(section)?;
    for owned in ctx.owned_paths() {
        filter = filter.with_skip_path(owned);
    }
    let mut detector = ChangeDetector::new(Arc::clone(&fs), filter, section.large_file_bytes, hashes);
    let last_scan = if opts.full_scan {
        None
    } else {
        orchestrator.last_scan_mtime
    };
    let changes = detector.detect_changes(ctx.root(), last_scan)?;

    let graph_lock = if opts.dry_run {
        None
    } else {
        let locks = scheduler.locks().clone();
        let acquired = tokio::task::spawn_blocking(move || {
            locks.acquire(GRAPH_LOCK_NAME, WaitPolicy::Bounded(GRAPH_LOCK_WAIT))
        })
        .await;
        match acquired {
            Ok(Ok(guard)) => guard,
            Ok(Err(err)) => {
                warn!(error = %err, "graph lock failed; graph will not be saved");
                None
            }
            Err(err) => {
                warn!(error = %err, "graph lock task failed; graph will not be saved");
                None
            }
        }
    };
    if graph_lock.is_none() && !opts.dry_run {
        warn!("dependency graph is busy; this run's graph updates will not be saved");
    }

    let mut store = DependencyGraphStore::load(fs.as_ref(), ctx.graph_path());
    let analysis = analyse_changes(fs.as_ref(), ctx.root(), &mut store, &changes.changed);

    let mut graph_saved = analysis.analysed.is_empty();
    if let Some(guard) = graph_lock {
        if !graph_saved {
            match store.save(fs.as_ref(), ctx.graph_path()) {
                Ok(()) => graph_saved = true,
                Err(err) => warn!(error = %err, "failed to save dependency graph"),
            }
        }
        if let Err(err) = guard.release() {
            warn!(error = %err, "failed to release graph lock");
        }
    }

    // Files whose facts never reached the graph must be seen as changed again.
    if !graph_saved && !opts.dry_run {
        for rel in &analysis.analysed {
            detector.forget(rel);
        }
    }

    let planned_workers = if opts.no_workers || changes.is_empty() {
        Vec::new()
    } else if opts.workers.is_empty() {
        cfg.default_worker_names()
    } else {
        opts.workers.clone()
    };

    let mut reports = BTreeMap::new();
    if opts.dry_run {
        info!(workers = ?planned_workers, "dry run; nothing dispatched or saved");
    } else {
        if !planned_workers.is_empty() {
            let budget = BudgetPlan::from_config(cfg, changes.changed.len());
            let dispatch = DispatchContext {
                risk: analysis.assessment.level,
                changed_files: analysis.changed.clone(),
                prompt: opts.prompt.clone(),
            };
            reports = scheduler
                .run(&planned_workers, &budget, &dispatch, invoker)
                .await;
        }

        if graph_saved && changes.root_mtime.is_some() {
            orchestrator.last_scan_mtime = changes.root_mtime;
        }
        if let Err(err) = scheduler.persist(
            &mut orchestrator,
            &reports,
            opts.prompt.as_deref(),
            detector.cache(),
        ) {
            warn!(error = %err, "failed to persist run state");
        }
    }

    Ok(RunSummary {
        reclaimed_locks,
        changes,
        analysis,
        planned_workers,
        reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_summary_mentions_the_shortcut() {
        let mut changes = ChangeSet {
            scanned: 12,
            changed: ["a.py".to_string()].into_iter().collect(),
            ..ChangeSet::default()
        };
        assert_eq!(scan_summary(&changes), "Scanned 12 file(s), 1 changed");

        changes.fast_path = true;
        assert!(scan_summary(&changes).contains("unchanged"));
    }
}
