// src/graph/model.rs

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::extract::{DefinitionRecord, Extraction, Language};
use crate::types::Severity;

/// A definition that kept its name but changed its signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureChange {
    pub name: String,
    pub old: String,
    pub new: String,
}

impl fmt::Display for SignatureChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.name, self.old, self.new)
    }
}

/// Everything the graph knows about one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraphEntry {
    #[serde(default)]
    pub imports: BTreeSet<String>,
    #[serde(default)]
    pub definitions: Vec<DefinitionRecord>,
    #[serde(default)]
    pub calls: BTreeSet<String>,
    pub language: Language,
    /// Changes detected by the most recent merge of this file only.
    #[serde(default)]
    pub signature_changes: Vec<SignatureChange>,
}

impl DependencyGraphEntry {
    pub fn from_extraction(extraction: Extraction, language: Language) -> Self {
        Self {
            imports: extraction.imports,
            definitions: extraction.definitions,
            calls: extraction.calls,
            language,
            signature_changes: Vec::new(),
        }
    }

    pub fn definition_names(&self) -> BTreeSet<&str> {
        self.definitions.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Why a file is considered affected by a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImpactReason {
    /// One of its imports names the changed file.
    Imports,
    /// It calls definitions of the changed file.
    Calls(Vec<String>),
    /// It calls definitions of the changed file whose signature changed.
    CallsModified(Vec<String>),
}

impl fmt::Display for ImpactReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpactReason::Imports => f.write_str("imports"),
            ImpactReason::Calls(names) => write!(f, "calls: {}", names.join(", ")),
            ImpactReason::CallsModified(names) => write!(f, "calls_modified: {}", names.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpactEntry {
    pub reasons: Vec<ImpactReason>,
    pub severity: Severity,
}

impl ImpactEntry {
    pub fn reasons_text(&self) -> String {
        self.reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
