// src/analysis.rs

//! One analysis pass: extract every changed file, merge it into the graph,
//! then compute impacts, cycles and the risk verdict.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::{debug, info};

use crate::extract::{Language, extract_file};
use crate::fs::FileSystem;
use crate::graph::risk::ImpactsByFile;
use crate::graph::{
    DependencyGraphStore, ImpactAnalyzer, ImportGraph, RiskAssessment, SignatureChange, classify,
};

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Every changed file, analysed or not.
    pub changed: Vec<String>,
    /// Changed files that were extracted and merged.
    pub analysed: Vec<String>,
    pub signature_changes: BTreeMap<String, Vec<SignatureChange>>,
    pub impacts: ImpactsByFile,
    pub cycle: Option<Vec<String>>,
    pub assessment: RiskAssessment,
}

/// Analyse `changed` (root-relative paths) against `store`.
///
/// Files in an unrecognised language count as changed but are not
/// extracted. All merges happen before any impact is computed, so the
/// result does not depend on the order of `changed`.
pub fn analyse_changes(
    fs: &dyn FileSystem,
    root: &Path,
    store: &mut DependencyGraphStore,
    changed: &BTreeSet<String>,
) -> AnalysisOutcome {
    let mut analysed = Vec::new();
    let mut signature_changes = BTreeMap::new();

    for rel in changed {
        let language = Language::from_path(rel);
        if !language.is_known() {
            debug!(path = %rel, "unrecognised language; not analysed");
            continue;
        }
        let extraction = extract_file(fs, &root.join(rel), language);
        let changes = store.merge(rel, extraction, language);
        if !changes.is_empty() {
            signature_changes.insert(rel.clone(), changes);
        }
        analysed.push(rel.clone());
    }

    let analyzer = ImpactAnalyzer::new(store);
    let impacts: ImpactsByFile = analysed
        .iter()
        .map(|rel| (rel.clone(), analyzer.find_impacted(rel)))
        .filter(|(_, impacted)| !impacted.is_empty())
        .collect();

    let cycle = if analysed.is_empty() {
        None
    } else {
        ImportGraph::build(store).find_cycle()
    };

    let changed: Vec<String> = changed.iter().cloned().collect();
    let assessment = classify(&changed, &impacts, &signature_changes, cycle.as_deref());

    info!(
        changed = changed.len(),
        analysed = analysed.len(),
        impacted = assessment.total_impacted,
        risk = %assessment.level,
        "analysis finished"
    );

    AnalysisOutcome {
        changed,
        analysed,
        signature_changes,
        impacts,
        cycle,
        assessment,
    }
}
