// src/extract/heuristic.rs

//! Line-oriented fallback for files without a usable syntax tree.
//!
//! Recognises `import` / `from` statements and declarations introduced by a
//! small set of keywords. Call sites are not recovered.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{DefinitionKind, DefinitionRecord, Extraction, normalize_whitespace};

static MODULE_SPECIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:import|export)\b.*?\bfrom\s+['"]([^'"]+)['"]|^\s*import\s+['"]([^'"]+)['"]"#)
        .expect("module specifier regex is valid")
});

static FROM_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*from\s+([A-Za-z_][\w.]*)\s+import\b")
        .expect("from-import regex is valid")
});

static PLAIN_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*import\s+(?:static\s+)?([A-Za-z_][\w.]*)")
        .expect("import regex is valid")
});

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(?:export|default|public|private|protected|internal|open|static|final|abstract|async|pub(?:\([^)]*\))?)\s+)*(def|class|func|function|fn|struct|protocol|trait|interface)\s+([A-Za-z_]\w*)\s*(?:<[^>]*>)?\s*(\([^)]*\))?",
    )
    .expect("declaration regex is valid")
});

fn top_level(dotted: &str) -> &str {
    dotted.split('.').next().unwrap_or(dotted)
}

fn import_of(line: &str) -> Option<String> {
    if let Some(caps) = MODULE_SPECIFIER.captures(line) {
        return caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string());
    }
    if let Some(caps) = FROM_IMPORT.captures(line) {
        return caps.get(1).map(|m| top_level(m.as_str()).to_string());
    }
    PLAIN_IMPORT
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| top_level(m.as_str()).to_string())
}

fn definition_of(line: &str, line_no: usize) -> Option<DefinitionRecord> {
    let caps = DECLARATION.captures(line)?;
    let keyword = caps.get(1)?.as_str();
    let name = caps.get(2)?.as_str();
    let params = caps.get(3).map(|m| m.as_str());

    let (kind, signature) = match keyword {
        "def" => (DefinitionKind::Function, format!("{name}{}", params.unwrap_or("()"))),
        "func" | "function" | "fn" => (
            DefinitionKind::Function,
            format!("{keyword} {name}{}", params.unwrap_or("()")),
        ),
        "class" => (DefinitionKind::Class, format!("class {name}")),
        "struct" => (DefinitionKind::Struct, format!("struct {name}")),
        _ => (DefinitionKind::Protocol, format!("{keyword} {name}")),
    };

    Some(DefinitionRecord {
        name: name.to_string(),
        kind,
        signature: normalize_whitespace(&signature),
        line: line_no,
    })
}

/// Extract imports and definitions by keyword matching.
pub fn extract(source: &str) -> Extraction {
    let mut imports = BTreeSet::new();
    let mut definitions = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        if let Some(import) = import_of(line) {
            imports.insert(import);
            continue;
        }
        definitions.extend(definition_of(line, idx + 1));
    }

    Extraction {
        imports,
        definitions,
        calls: BTreeSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_common_import_forms() {
        let src = "import os.path\n\
                   from collections import deque\n\
                   import React from 'react';\n\
                   import './side-effect.css';\n\
                   export { x } from \"./x\";\n\
                   import java.util.List;\n";
        let ex = extract(src);
        let imports: Vec<_> = ex.imports.iter().map(String::as_str).collect();
        assert_eq!(
            imports,
            vec!["./side-effect.css", "./x", "collections", "java", "os", "react"]
        );
    }

    #[test]
    fn recognises_declarations_with_modifiers() {
        let src = "public protocol Drawable {\n\
                   open class View {\n\
                   \x20   func layout(in rect: CGRect) {\n\
                   pub(crate) fn run<T>(x: T) {\n\
                   export default function main() {\n";
        let ex = extract(src);
        let defs: Vec<_> = ex
            .definitions
            .iter()
            .map(|d| (d.kind, d.signature.as_str(), d.line))
            .collect();
        assert_eq!(
            defs,
            vec![
                (DefinitionKind::Protocol, "protocol Drawable", 1),
                (DefinitionKind::Class, "class View", 2),
                (DefinitionKind::Function, "func layout(in rect: CGRect)", 3),
                (DefinitionKind::Function, "fn run(x: T)", 4),
                (DefinitionKind::Function, "function main()", 5),
            ]
        );
        assert!(ex.calls.is_empty());
    }
}
