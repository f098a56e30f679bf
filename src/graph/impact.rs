// src/graph/impact.rs

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::model::{ImpactEntry, ImpactReason};
use crate::graph::resolve::{ImportResolver, SubstringResolver};
use crate::graph::store::DependencyGraphStore;
use crate::types::Severity;

/// Finds the files affected by a change to one file.
#[derive(Debug)]
pub struct ImpactAnalyzer<'a, R = SubstringResolver> {
    store: &'a DependencyGraphStore,
    resolver: R,
}

impl<'a> ImpactAnalyzer<'a, SubstringResolver> {
    pub fn new(store: &'a DependencyGraphStore) -> Self {
        Self::with_resolver(store, SubstringResolver)
    }
}

impl<'a, R: ImportResolver> ImpactAnalyzer<'a, R> {
    pub fn with_resolver(store: &'a DependencyGraphStore, resolver: R) -> Self {
        Self { store, resolver }
    }

    /// Every other known file linked to `changed_path`, keyed by path.
    ///
    /// A file is linked when one of its imports resolves to the changed file,
    /// or when it calls a name the changed file defines. Calls to names whose
    /// signature just changed make the impact `High`. Unknown paths have no
    /// impact.
    pub fn find_impacted(&self, changed_path: &str) -> BTreeMap<String, ImpactEntry> {
        let mut impacted = BTreeMap::new();
        let Some(changed) = self.store.get(changed_path) else {
            return impacted;
        };

        let defined = changed.definition_names();
        let modified: BTreeSet<&str> = changed
            .signature_changes
            .iter()
            .map(|c| c.name.as_str())
            .collect();

        for (path, entry) in self.store.iter() {
            if path == changed_path {
                continue;
            }

            let mut reasons = Vec::new();
            let mut severity = Severity::Medium;

            if entry
                .imports
                .iter()
                .any(|import| self.resolver.resolves_to(import, changed_path))
            {
                reasons.push(ImpactReason::Imports);
            }

            let called: Vec<String> = entry
                .calls
                .iter()
                .filter(|call| defined.contains(call.as_str()))
                .cloned()
                .collect();

            if !called.is_empty() {
                let hits_modified: Vec<String> = called
                    .iter()
                    .filter(|name| modified.contains(name.as_str()))
                    .cloned()
                    .collect();
                if hits_modified.is_empty() {
                    reasons.push(ImpactReason::Calls(called));
                } else {
                    severity = Severity::High;
                    reasons.push(ImpactReason::CallsModified(hits_modified));
                }
            }

            if !reasons.is_empty() {
                impacted.insert(path.to_string(), ImpactEntry { reasons, severity });
            }
        }

        impacted
    }
}
