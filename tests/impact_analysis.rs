use std::collections::BTreeSet;

use ripplewatch::analysis::analyse_changes;
use ripplewatch::fs::RealFileSystem;
use ripplewatch::graph::{DependencyGraphStore, ImpactReason};
use ripplewatch::types::{RiskLevel, Severity};
use ripplewatch_test_utils::builders::ProjectBuilder;
use ripplewatch_test_utils::init_tracing;

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn signature_change_propagates_to_callers_as_high_severity() {
    init_tracing();
    let project = ProjectBuilder::new()
        .file("A.py", "def helper(a):\n    return a\n")
        .file("B.py", "import A\n\nA.helper(1)\n")
        .file("C.py", "def unrelated():\n    pass\n");
    let mut store = DependencyGraphStore::new();

    let first = analyse_changes(&RealFileSystem, project.root(), &mut store, &set(&["A.py", "B.py", "C.py"]));
    assert!(first.signature_changes.is_empty());

    project.write("A.py", "def helper(a, b):\n    return a\n");
    let second = analyse_changes(&RealFileSystem, project.root(), &mut store, &set(&["A.py"]));

    let changes = &second.signature_changes["A.py"];
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].name, "helper");
    assert_eq!(changes[0].old, "helper(a)");
    assert_eq!(changes[0].new, "helper(a, b)");

    let impacted = &second.impacts["A.py"];
    assert_eq!(impacted.keys().collect::<Vec<_>>(), vec!["B.py"]);
    let b = &impacted["B.py"];
    assert_eq!(b.severity, Severity::High);
    assert_eq!(
        b.reasons,
        vec![
            ImpactReason::Imports,
            ImpactReason::CallsModified(vec!["helper".to_string()])
        ]
    );
    assert_eq!(second.assessment.level, RiskLevel::Medium);
    assert!(second.assessment.report.contains("helper: helper(a) -> helper(a, b)"));
}

#[test]
fn unchanged_signature_is_medium_and_low_risk_overall() {
    let project = ProjectBuilder::new()
        .file("lib.py", "def helper(a):\n    return a\n")
        .file("main.py", "from lib import helper\nhelper(1)\n");
    let mut store = DependencyGraphStore::new();
    analyse_changes(&RealFileSystem, project.root(), &mut store, &set(&["lib.py", "main.py"]));

    project.write("lib.py", "def helper(a):\n    return a + 1\n");
    let outcome = analyse_changes(&RealFileSystem, project.root(), &mut store, &set(&["lib.py"]));
    let main = &outcome.impacts["lib.py"]["main.py"];
    assert_eq!(main.severity, Severity::Medium);
    assert_eq!(main.reasons_text(), "imports; calls: helper");
    assert_eq!(outcome.assessment.level, RiskLevel::Low);
    assert_eq!(outcome.assessment.report, "Safe: 1 file(s) changed, low impact");
}

#[test]
fn three_file_import_cycle_is_high_risk() {
    let project = ProjectBuilder::new()
        .file("xray.py", "import yankee\n")
        .file("yankee.py", "import zulu\n")
        .file("zulu.py", "import xray\n");
    let mut store = DependencyGraphStore::new();
    let outcome = analyse_changes(
        &RealFileSystem,
        project.root(),
        &mut store,
        &set(&["xray.py", "yankee.py", "zulu.py"]),
    );
    let cycle = outcome.cycle.clone().unwrap();
    assert_eq!(cycle.len(), 3);
    assert_eq!(outcome.assessment.level, RiskLevel::High);
    assert!(outcome.assessment.report.contains("circular dependency"));
}

#[test]
fn import_chain_is_not_a_cycle() {
    let project = ProjectBuilder::new()
        .file("xray.py", "import yankee\n")
        .file("yankee.py", "import zulu\n")
        .file("zulu.py", "import os\n");
    let mut store = DependencyGraphStore::new();
    let outcome = analyse_changes(
        &RealFileSystem,
        project.root(),
        &mut store,
        &set(&["xray.py", "yankee.py", "zulu.py"]),
    );
    assert!(outcome.cycle.is_none());
}

#[test]
fn widely_imported_module_is_high_risk() {
    let mut project = ProjectBuilder::new().file("core.py", "def boot():\n    pass\n");
    let mut all = vec!["core.py".to_string()];
    for i in 0..16 {
        let rel = format!("svc{i:02}.py");
        project = project.file(&rel, "import core\n");
        all.push(rel);
    }
    let mut store = DependencyGraphStore::new();
    let changed: BTreeSet<String> = all.into_iter().collect();
    analyse_changes(&RealFileSystem, project.root(), &mut store, &changed);

    project.write("core.py", "def boot():\n    return 1\n");
    let outcome = analyse_changes(&RealFileSystem, project.root(), &mut store, &set(&["core.py"]));
    assert_eq!(outcome.assessment.total_impacted, 16);
    assert_eq!(outcome.assessment.level, RiskLevel::High);
}

#[test]
fn unknown_languages_count_but_are_not_analysed() {
    let project = ProjectBuilder::new().file("README.md", "# hi\n");
    let mut store = DependencyGraphStore::new();
    let outcome = analyse_changes(&RealFileSystem, project.root(), &mut store, &set(&["README.md"]));
    assert_eq!(outcome.changed, vec!["README.md".to_string()]);
    assert!(outcome.analysed.is_empty());
    assert!(store.is_empty());
    assert_eq!(outcome.assessment.level, RiskLevel::Low);
}

#[test]
fn mixed_language_project_links_js_importers() {
    let project = ProjectBuilder::new()
        .file("web/format.js", "export function format(s) { return s; }\n")
        .file("web/app.js", "import { format } from './format';\nformat('x');\n");
    let mut store = DependencyGraphStore::new();
    analyse_changes(
        &RealFileSystem,
        project.root(),
        &mut store,
        &set(&["web/app.js", "web/format.js"]),
    );

    project.write("web/format.js", "export function format(s, opts) { return s; }\n");
    let outcome = analyse_changes(&RealFileSystem, project.root(), &mut store, &set(&["web/format.js"]));
    let app = &outcome.impacts["web/format.js"]["web/app.js"];
    assert_eq!(app.severity, Severity::High);
    assert_eq!(app.reasons_text(), "imports; calls_modified: format");
}
