// src/graph/store.rs

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::extract::{DefinitionRecord, Extraction, Language};
use crate::fs::FileSystem;
use crate::graph::model::{DependencyGraphEntry, SignatureChange};

/// Owns every [`DependencyGraphEntry`], keyed by root-relative path.
///
/// Persisted as a JSON object mapping path to entry. Entries are kept in a
/// `BTreeMap` so the file and every traversal over it are ordered by path.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DependencyGraphStore {
    entries: BTreeMap<String, DependencyGraphEntry>,
}

/// Signature changes between two definition lists.
///
/// Only names present on both sides are compared; additions and removals
/// are not changes. With duplicate names the last definition wins.
pub fn signature_changes(old: &[DefinitionRecord], new: &[DefinitionRecord]) -> Vec<SignatureChange> {
    let old_sigs: BTreeMap<&str, &str> = old
        .iter()
        .map(|d| (d.name.as_str(), d.signature.as_str()))
        .collect();
    let new_sigs: BTreeMap<&str, &str> = new
        .iter()
        .map(|d| (d.name.as_str(), d.signature.as_str()))
        .collect();

    new_sigs
        .iter()
        .filter_map(|(name, new_sig)| {
            let old_sig = old_sigs.get(name)?;
            (old_sig != new_sig).then(|| SignatureChange {
                name: name.to_string(),
                old: old_sig.to_string(),
                new: new_sig.to_string(),
            })
        })
        .collect()
}

impl DependencyGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the graph from `path`; absent or corrupt files yield an empty graph.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Self {
        if !fs.exists(path) {
            debug!(path = ?path, "no dependency graph yet");
            return Self::new();
        }
        let parsed = fs
            .read_to_string(path)
            .and_then(|text| Ok(serde_json::from_str::<BTreeMap<String, DependencyGraphEntry>>(&text)?));
        match parsed {
            Ok(entries) => {
                debug!(path = ?path, files = entries.len(), "loaded dependency graph");
                Self { entries }
            }
            Err(err) => {
                warn!(path = ?path, error = %err, "dependency graph unreadable; starting from empty");
                Self::new()
            }
        }
    }

    pub fn save(&self, fs: &dyn FileSystem, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.entries)?;
        fs.write(path, &json)
            .with_context(|| format!("writing dependency graph at {:?}", path))?;
        info!(path = ?path, files = self.entries.len(), "stored dependency graph");
        Ok(())
    }

    /// Replace the entry for `path` with freshly extracted facts.
    ///
    /// Returns the signature changes relative to the previous entry, which
    /// are also stored on the new entry.
    pub fn merge(&mut self, path: &str, extraction: Extraction, language: Language) -> Vec<SignatureChange> {
        let changes = self
            .entries
            .get(path)
            .map(|prev| signature_changes(&prev.definitions, &extraction.definitions))
            .unwrap_or_default();

        if !changes.is_empty() {
            debug!(path, count = changes.len(), "signature changes detected");
        }

        let mut entry = DependencyGraphEntry::from_extraction(extraction, language);
        entry.signature_changes = changes.clone();
        self.entries.insert(path.to_string(), entry);
        changes
    }

    pub fn get(&self, path: &str) -> Option<&DependencyGraphEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DependencyGraphEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
