use std::collections::BTreeMap;

use proptest::prelude::*;
use ripplewatch::graph::risk::ImpactsByFile;
use ripplewatch::graph::{ImpactEntry, ImpactReason, classify};
use ripplewatch::types::{RiskLevel, Severity};

fn impacts(medium: usize, high: usize) -> ImpactsByFile {
    let mut targets = BTreeMap::new();
    for i in 0..medium {
        targets.insert(
            format!("m{i:03}.py"),
            ImpactEntry {
                reasons: vec![ImpactReason::Imports],
                severity: Severity::Medium,
            },
        );
    }
    for i in 0..high {
        targets.insert(
            format!("h{i:03}.py"),
            ImpactEntry {
                reasons: vec![ImpactReason::CallsModified(vec!["f".to_string()])],
                severity: Severity::High,
            },
        );
    }
    let mut by_file = BTreeMap::new();
    if !targets.is_empty() {
        by_file.insert("core.py".to_string(), targets);
    }
    by_file
}

fn level(medium: usize, high: usize, cycle: bool) -> RiskLevel {
    let changed = vec!["core.py".to_string()];
    let cycle_path = vec!["a.py".to_string(), "b.py".to_string()];
    classify(
        &changed,
        &impacts(medium, high),
        &BTreeMap::new(),
        cycle.then_some(cycle_path.as_slice()),
    )
    .level
}

proptest! {
    #[test]
    fn more_impacted_files_never_lower_the_risk(medium in 0usize..40, high in 0usize..10, extra in 1usize..10) {
        prop_assert!(level(medium + extra, high, false) >= level(medium, high, false));
        prop_assert!(level(medium, high + extra, false) >= level(medium, high, false));
    }

    #[test]
    fn a_cycle_is_always_high(medium in 0usize..40, high in 0usize..10) {
        prop_assert_eq!(level(medium, high, true), RiskLevel::High);
    }

    #[test]
    fn low_risk_report_never_lists_impacts(medium in 0usize..=5) {
        let changed = vec!["core.py".to_string()];
        let assessment = classify(&changed, &impacts(medium, 0), &BTreeMap::new(), None);
        prop_assert_eq!(assessment.level, RiskLevel::Low);
        prop_assert!(assessment.report.starts_with("Safe:"));
    }
}
