use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use proptest::prelude::*;
use ripplewatch::change::{ChangeDetector, FileHashCache, ScanFilter};
use ripplewatch::fs::mock::MockFileSystem;

fn files() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(
        prop::sample::select(vec![
            "a.py", "b.rs", "lib/c.ts", "lib/d.js", "lib/deep/e.py", ".hidden/f.py",
            "node_modules/g.js", ".claude/h.json",
        ])
        .prop_map(str::to_string),
        "[a-z ]{0,24}",
        1..5,
    )
}

fn detector(fs: &MockFileSystem) -> ChangeDetector {
    ChangeDetector::new(
        Arc::new(fs.clone()),
        ScanFilter::new(vec![".claude".into()], vec!["node_modules".into()]),
        1_000_000,
        FileHashCache::new(),
    )
}

fn visible(rel: &str) -> bool {
    !rel.starts_with(".hidden/") && !rel.starts_with("node_modules/")
}

proptest! {
    #[test]
    fn rescanning_without_edits_reports_nothing(initial in files()) {
        let fs = MockFileSystem::new();
        for (rel, body) in &initial {
            fs.add_file(format!("./{rel}"), body.as_bytes());
        }
        let mut det = detector(&fs);

        let first = det.detect_changes(Path::new("."), None).unwrap();
        let expected: BTreeSet<String> = initial.keys().filter(|r| visible(r)).cloned().collect();
        prop_assert_eq!(&first.changed, &expected);

        let second = det.detect_changes(Path::new("."), None).unwrap();
        prop_assert!(second.changed.is_empty());
    }

    #[test]
    fn exactly_the_edited_files_are_reported(initial in files(), edits in files()) {
        let fs = MockFileSystem::new();
        for (rel, body) in &initial {
            fs.add_file(format!("./{rel}"), body.as_bytes());
        }
        let mut det = detector(&fs);
        det.detect_changes(Path::new("."), None).unwrap();

        let mut expected = BTreeSet::new();
        for (rel, body) in &edits {
            if initial.get(rel) != Some(body) && visible(rel) {
                expected.insert(rel.clone());
            }
            fs.add_file(format!("./{rel}"), body.as_bytes());
        }

        let changes = det.detect_changes(Path::new("."), None).unwrap();
        prop_assert_eq!(changes.changed, expected);
    }
}
