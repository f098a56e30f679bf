use std::time::Duration;

use ripplewatch::config::{default_config_path, load_and_validate, load_or_default};
use ripplewatch::engine::BudgetPlan;
use ripplewatch::errors::RippleError;
use ripplewatch_test_utils::builders::ProjectBuilder;

const SAMPLE: &str = r#"
[config]
stale_lock_secs = 120
large_file_bytes = 2048
exclude = ["data/**"]
default_workers = ["docs"]

[timeouts]
small_secs = 30

[worker.docs]
cmd = "make docs"

[worker.tests]
cmd = "cargo nextest run"
timeout_secs = 900
"#;

#[test]
fn config_file_in_root_is_loaded() {
    let project = ProjectBuilder::new().file("Ripplewatch.toml", SAMPLE);
    let cfg = load_and_validate(default_config_path(project.root())).unwrap();

    let section = cfg.config_section();
    assert_eq!(section.stale_lock_secs, 120);
    assert_eq!(section.large_file_bytes, 2048);
    assert_eq!(section.allowed_dot_dirs, vec![".claude".to_string()]);
    assert_eq!(cfg.default_worker_names(), vec!["docs".to_string()]);
    assert_eq!(cfg.workers()["tests"].timeout_secs, Some(900));

    let plan = BudgetPlan::from_config(&cfg, 3);
    assert_eq!(plan.for_worker("docs"), Duration::from_secs(30));
    assert_eq!(plan.for_worker("tests"), Duration::from_secs(900));
    let plan = BudgetPlan::from_config(&cfg, 60);
    assert_eq!(plan.for_worker("docs"), Duration::from_secs(180));
}

#[test]
fn invalid_worker_names_are_rejected() {
    let project = ProjectBuilder::new().file("Ripplewatch.toml", "[worker.\"bad name\"]\ncmd = \"x\"\n");
    let err = load_and_validate(project.path("Ripplewatch.toml")).unwrap_err();
    assert!(matches!(err, RippleError::InvalidWorkerName(_)));
}

#[test]
fn broken_or_missing_config_falls_back_to_defaults() {
    let project = ProjectBuilder::new().file("Ripplewatch.toml", "[config\nnot toml");
    let cfg = load_or_default(project.path("Ripplewatch.toml"));
    assert_eq!(cfg.config_section().stale_lock_secs, 600);

    let cfg = load_or_default(project.path("missing.toml"));
    assert!(cfg.workers().is_empty());
}
