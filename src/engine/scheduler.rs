// src/engine/scheduler.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::change::FileHashCache;
use crate::context::Context;
use crate::engine::budget::BudgetPlan;
use crate::engine::state::OrchestratorCache;
use crate::engine::{WorkerName, WorkerOutcome, WorkerReport};
use crate::exec::{WorkerInvoker, WorkerRequest};
use crate::fs::FileSystem;
use crate::lock::{NamedLock, WaitPolicy};
use crate::types::RiskLevel;

/// What the analysis pass hands to every worker of a run.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub risk: RiskLevel,
    pub changed_files: Vec<String>,
    pub prompt: Option<String>,
}

/// Runs workers concurrently, one named lock per worker.
///
/// Every worker's lock is taken before it starts and released after it
/// finishes, fails, panics or times out. Siblings never wait on each other.
#[derive(Debug, Clone)]
pub struct Scheduler {
    ctx: Arc<Context>,
    fs: Arc<dyn FileSystem>,
    locks: NamedLock,
}

fn dedup(desired: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(desired.len());
    for name in desired {
        if !seen.contains(name) {
            seen.push(name.clone());
        }
    }
    seen
}

impl Scheduler {
    pub fn new(ctx: Arc<Context>, fs: Arc<dyn FileSystem>) -> Self {
        let locks = NamedLock::new(ctx.lock_dir());
        Self { ctx, fs, locks }
    }

    pub fn locks(&self) -> &NamedLock {
        &self.locks
    }

    /// Dispatch `desired` workers and wait for all of them.
    pub async fn run(
        &self,
        desired: &[String],
        budget: &BudgetPlan,
        dispatch: &DispatchContext,
        invoker: Arc<dyn WorkerInvoker>,
    ) -> BTreeMap<WorkerName, WorkerReport> {
        let mut reports = BTreeMap::new();
        let mut running: Vec<(WorkerName, Instant, JoinHandle<WorkerReport>)> = Vec::new();

        for name in dedup(desired) {
            let started = Instant::now();
            let guard = match self.locks.acquire(&name, WaitPolicy::NonBlocking) {
                Ok(Some(guard)) => guard,
                Ok(None) => {
                    info!(worker = %name, "worker already running; skipping");
                    reports.insert(
                        name.clone(),
                        WorkerReport {
                            name,
                            outcome: WorkerOutcome::AlreadyRunning,
                            elapsed: started.elapsed(),
                        },
                    );
                    continue;
                }
                Err(err) => {
                    warn!(worker = %name, error = %err, "could not take worker lock; skipping");
                    reports.insert(
                        name.clone(),
                        WorkerReport {
                            name,
                            outcome: WorkerOutcome::LockUnavailable(err.to_string()),
                            elapsed: started.elapsed(),
                        },
                    );
                    continue;
                }
            };

            let timeout = budget.for_worker(&name);
            let request = WorkerRequest {
                name: name.clone(),
                root: self.ctx.root().to_path_buf(),
                risk: dispatch.risk,
                changed_files: dispatch.changed_files.clone(),
                prompt: dispatch.prompt.clone(),
                timeout,
            };
            let invoker = Arc::clone(&invoker);

            debug!(worker = %name, timeout_secs = timeout.as_secs(), "dispatching worker");
            let handle = tokio::spawn(async move {
                let name = request.name.clone();
                let result = tokio::time::timeout(timeout, invoker.invoke(request)).await;
                let outcome = match result {
                    Ok(Ok(output)) => WorkerOutcome::Completed(output),
                    Ok(Err(err)) => WorkerOutcome::Failed(format!("{err:#}")),
                    Err(_) => WorkerOutcome::TimedOut(timeout),
                };
                if let Err(err) = guard.release() {
                    warn!(worker = %name, error = %err, "failed to release worker lock");
                }
                WorkerReport {
                    name,
                    outcome,
                    elapsed: started.elapsed(),
                }
            });
            running.push((name, started, handle));
        }

        for (name, started, handle) in running {
            let report = match handle.await {
                Ok(report) => report,
                Err(join_err) => {
                    // The guard was dropped during unwinding, so the lock is
                    // already released.
                    error!(worker = %name, error = %join_err, "worker task panicked");
                    WorkerReport {
                        name: name.clone(),
                        outcome: WorkerOutcome::Failed(format!("worker task panicked: {join_err}")),
                        elapsed: started.elapsed(),
                    }
                }
            };
            info!(worker = %name, outcome = %report.outcome, elapsed_ms = report.elapsed.as_millis() as u64, "worker finished");
            reports.insert(name, report);
        }

        reports
    }

    /// Persist run state once every outcome is in.
    pub fn persist(
        &self,
        cache: &mut OrchestratorCache,
        reports: &BTreeMap<WorkerName, WorkerReport>,
        prompt: Option<&str>,
        hashes: &FileHashCache,
    ) -> Result<()> {
        let dispatched: Vec<String> = reports
            .values()
            .filter(|r| r.outcome.was_dispatched())
            .map(|r| r.name.clone())
            .collect();
        cache.record_run(&dispatched, prompt);

        let fs = self.fs.as_ref();
        cache.save(fs, &self.ctx.orchestrator_cache_path())?;
        hashes.save(fs, &self.ctx.hash_cache_path())?;
        Ok(())
    }
}
