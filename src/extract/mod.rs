// src/extract/mod.rs

//! Per-language extraction of imports, definitions and call sites.
//!
//! Languages with a tree-sitter grammar go through a [`LanguageExtractor`].
//! When no extractor exists, or the parse produces a tree with syntax
//! errors, the keyword [`heuristic`] takes over; it recovers imports and
//! definitions but never call sites.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tree_sitter::{Node, Parser, Tree};

use crate::fs::FileSystem;

pub mod heuristic;
pub mod javascript;
pub mod language;
pub mod python;
pub mod rust;
mod walk;

pub use language::Language;

/// Kind of a top-level or nested named definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Function,
    Method,
    Class,
    Struct,
    Protocol,
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DefinitionKind::Function => "function",
            DefinitionKind::Method => "method",
            DefinitionKind::Class => "class",
            DefinitionKind::Struct => "struct",
            DefinitionKind::Protocol => "protocol",
        };
        f.write_str(s)
    }
}

/// A named definition found in a source file.
///
/// `signature` is the keyword (where the language has one), the name and the
/// whitespace-normalised parameter list, e.g. `fn parse(input: &str)` or
/// `helper(a, b)` for Python.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionRecord {
    pub name: String,
    pub kind: DefinitionKind,
    pub signature: String,
    /// 1-based.
    pub line: usize,
}

/// Everything extracted from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub imports: BTreeSet<String>,
    pub definitions: Vec<DefinitionRecord>,
    pub calls: BTreeSet<String>,
}

/// Syntax-tree extraction for one grammar.
pub trait LanguageExtractor: Send + Sync {
    fn grammar(&self) -> tree_sitter::Language;

    fn extract_imports(&self, root: Node<'_>, source: &str) -> BTreeSet<String>;

    fn extract_definitions(&self, root: Node<'_>, source: &str) -> Vec<DefinitionRecord>;

    fn extract_calls(&self, root: Node<'_>, source: &str) -> BTreeSet<String>;
}

/// The extractor for `language`, if it has a grammar.
pub fn extractor_for(language: Language) -> Option<&'static dyn LanguageExtractor> {
    match language {
        Language::Python => Some(&python::PythonExtractor),
        Language::Rust => Some(&rust::RustExtractor),
        Language::JavaScript => Some(&javascript::JAVASCRIPT),
        Language::TypeScript => Some(&javascript::TYPESCRIPT),
        Language::Tsx => Some(&javascript::TSX),
        _ => None,
    }
}

fn parse(extractor: &dyn LanguageExtractor, source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    if let Err(err) = parser.set_language(&extractor.grammar()) {
        warn!(error = %err, "grammar rejected by parser");
        return None;
    }
    let tree = parser.parse(source, None)?;
    if tree.root_node().has_error() {
        return None;
    }
    Some(tree)
}

/// Extract from in-memory source text.
pub fn extract_source(source: &str, language: Language) -> Extraction {
    if let Some(extractor) = extractor_for(language) {
        if let Some(tree) = parse(extractor, source) {
            let root = tree.root_node();
            return Extraction {
                imports: extractor.extract_imports(root, source),
                definitions: extractor.extract_definitions(root, source),
                calls: extractor.extract_calls(root, source),
            };
        }
        debug!(language = %language, "syntax errors in source; using heuristic extraction");
    }
    heuristic::extract(source)
}

/// Extract from a file on disk. Unreadable files yield an empty extraction.
pub fn extract_file(fs: &dyn FileSystem, path: &Path, language: Language) -> Extraction {
    match fs.read_to_string(path) {
        Ok(source) => extract_source(&source, language),
        Err(err) => {
            warn!(path = ?path, error = %err, "cannot read source for extraction");
            Extraction::default()
        }
    }
}

/// Whether `s` looks like a plain identifier.
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Collapse whitespace runs (including newlines) into single spaces.
pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
