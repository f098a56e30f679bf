use std::sync::Arc;
use std::time::Duration;

use ripplewatch::change::FileHashCache;
use ripplewatch::engine::{
    BudgetPlan, DispatchContext, OrchestratorCache, Scheduler, WorkerOutcome,
};
use ripplewatch::exec::WorkerInvoker;
use ripplewatch::fs::{FileSystem, RealFileSystem};
use ripplewatch::types::RiskLevel;
use ripplewatch_test_utils::builders::ProjectBuilder;
use ripplewatch_test_utils::fake_invoker::{Behaviour, FakeInvoker};
use ripplewatch_test_utils::{init_tracing, with_timeout};

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn scheduler_for(project: &ProjectBuilder) -> Scheduler {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    Scheduler::new(Arc::new(project.context()), fs)
}

fn dispatch() -> DispatchContext {
    DispatchContext {
        risk: RiskLevel::Medium,
        changed_files: names(&["src/app.py"]),
        prompt: Some("tidy up".to_string()),
    }
}

#[tokio::test]
async fn workers_run_concurrently_and_release_their_locks() {
    init_tracing();
    let project = ProjectBuilder::new();
    let scheduler = scheduler_for(&project);
    let delay = Duration::from_millis(200);
    let fake = FakeInvoker::new()
        .with("docs", Behaviour::Delay(delay, "docs done".into()))
        .with("tests", Behaviour::Delay(delay, "tests done".into()))
        .with("lint", Behaviour::Delay(delay, "lint done".into()));
    let invoker: Arc<dyn WorkerInvoker> = Arc::new(fake.clone());

    let reports = with_timeout(scheduler.run(
        &names(&["docs", "tests", "lint"]),
        &BudgetPlan::uniform(Duration::from_secs(5)),
        &dispatch(),
        invoker,
    ))
    .await;

    assert_eq!(fake.peak_concurrency(), 3);
    assert_eq!(reports.len(), 3);
    assert_eq!(
        reports["docs"].outcome,
        WorkerOutcome::Completed("docs done".into())
    );
    for name in ["docs", "tests", "lint"] {
        assert!(reports[name].outcome.is_success());
        assert!(!scheduler.locks().is_held(name));
    }

    let req = fake
        .requests()
        .into_iter()
        .find(|r| r.name == "docs")
        .unwrap();
    assert_eq!(req.risk, RiskLevel::Medium);
    assert_eq!(req.changed_files, names(&["src/app.py"]));
    assert_eq!(req.prompt.as_deref(), Some("tidy up"));
    assert_eq!(req.timeout, Duration::from_secs(5));
}

#[tokio::test]
async fn worker_held_elsewhere_is_skipped() {
    let project = ProjectBuilder::new();
    let scheduler = scheduler_for(&project);
    let _held = scheduler.locks().try_acquire("docs").unwrap().unwrap();
    let fake = FakeInvoker::new();

    let reports = with_timeout(scheduler.run(
        &names(&["docs", "tidy"]),
        &BudgetPlan::uniform(Duration::from_secs(5)),
        &dispatch(),
        Arc::new(fake.clone()),
    ))
    .await;

    assert_eq!(reports["docs"].outcome, WorkerOutcome::AlreadyRunning);
    assert!(!reports["docs"].outcome.was_dispatched());
    assert!(reports["tidy"].outcome.is_success());
    assert_eq!(fake.invoked(), names(&["tidy"]));
    assert!(scheduler.locks().is_held("docs"));
}

#[tokio::test]
async fn duplicate_names_dispatch_once() {
    let project = ProjectBuilder::new();
    let scheduler = scheduler_for(&project);
    let fake = FakeInvoker::new();

    let reports = with_timeout(scheduler.run(
        &names(&["docs", "docs"]),
        &BudgetPlan::uniform(Duration::from_secs(5)),
        &dispatch(),
        Arc::new(fake.clone()),
    ))
    .await;

    assert_eq!(reports.len(), 1);
    assert_eq!(fake.invoked(), names(&["docs"]));
}

#[tokio::test]
async fn timeout_failure_and_panic_are_isolated() {
    let project = ProjectBuilder::new();
    let scheduler = scheduler_for(&project);
    let fake = FakeInvoker::new()
        .with("slow", Behaviour::Delay(Duration::from_secs(30), "never".into()))
        .with("broken", Behaviour::Fail("exit status 2".into()))
        .with("crashy", Behaviour::Panic)
        .with("fine", Behaviour::Succeed("all good".into()));
    let budget = BudgetPlan::uniform(Duration::from_secs(5))
        .with_override("slow", Duration::from_millis(150));

    let reports = with_timeout(scheduler.run(
        &names(&["slow", "broken", "crashy", "fine"]),
        &budget,
        &dispatch(),
        Arc::new(fake.clone()),
    ))
    .await;

    assert_eq!(
        reports["slow"].outcome,
        WorkerOutcome::TimedOut(Duration::from_millis(150))
    );
    match &reports["broken"].outcome {
        WorkerOutcome::Failed(msg) => assert!(msg.contains("exit status 2"), "{msg}"),
        other => panic!("unexpected outcome {other:?}"),
    }
    match &reports["crashy"].outcome {
        WorkerOutcome::Failed(msg) => assert!(msg.contains("panicked"), "{msg}"),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(
        reports["fine"].outcome,
        WorkerOutcome::Completed("all good".into())
    );

    for name in ["slow", "broken", "crashy", "fine"] {
        assert!(reports[name].outcome.was_dispatched());
        assert!(!scheduler.locks().is_held(name), "{name} still locked");
        assert!(scheduler.locks().try_acquire(name).unwrap().is_some());
    }
}

#[tokio::test]
async fn persist_writes_both_caches() {
    let project = ProjectBuilder::new();
    let ctx = Arc::new(project.context());
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let scheduler = Scheduler::new(Arc::clone(&ctx), Arc::clone(&fs));
    let fake = FakeInvoker::new();
    let _held = scheduler.locks().try_acquire("busy").unwrap().unwrap();

    let reports = with_timeout(scheduler.run(
        &names(&["docs", "busy"]),
        &BudgetPlan::uniform(Duration::from_secs(5)),
        &dispatch(),
        Arc::new(fake),
    ))
    .await;

    let mut hashes = FileHashCache::new();
    hashes.insert("src/app.py", "abc123");
    let mut cache = OrchestratorCache::default();
    scheduler
        .persist(&mut cache, &reports, Some("tidy up"), &hashes)
        .unwrap();

    let loaded = OrchestratorCache::load(fs.as_ref(), &ctx.orchestrator_cache_path());
    assert_eq!(loaded.last_workers, names(&["docs"]));
    assert_eq!(loaded.last_prompt.as_deref(), Some("tidy up"));
    assert!(loaded.last_run.is_some());

    let loaded_hashes = FileHashCache::load(fs.as_ref(), &ctx.hash_cache_path());
    assert_eq!(loaded_hashes.get("src/app.py"), Some("abc123"));
}
