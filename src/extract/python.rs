// src/extract/python.rs

use std::collections::BTreeSet;

use tree_sitter::Node;

use super::walk::{field_text, for_each_node, last_segment, line_of, text};
use super::{DefinitionKind, DefinitionRecord, LanguageExtractor, is_identifier, normalize_whitespace};

/// Python: imports are reduced to their top-level package (`os.path` ->
/// `os`), signatures are `name(params)` since Python has no keyword worth
/// comparing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonExtractor;

fn top_level(dotted: &str) -> Option<String> {
    let first = dotted.split('.').next()?.trim();
    is_identifier(first).then(|| first.to_string())
}

fn module_of(node: Node<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "dotted_name" => top_level(text(node, source)),
        "aliased_import" => node
            .child_by_field_name("name")
            .and_then(|n| top_level(text(n, source))),
        "relative_import" => {
            let mut cursor = node.walk();
            let dotted = node
                .named_children(&mut cursor)
                .find(|c| c.kind() == "dotted_name");
            dotted.and_then(|n| top_level(text(n, source)))
        }
        _ => None,
    }
}

/// `def` directly inside a class body (possibly decorated) is a method.
fn enclosing_class(def: Node<'_>) -> bool {
    let mut parent = def.parent();
    if parent.is_some_and(|p| p.kind() == "decorated_definition") {
        parent = parent.and_then(|p| p.parent());
    }
    parent
        .filter(|p| p.kind() == "block")
        .and_then(|p| p.parent())
        .is_some_and(|p| p.kind() == "class_definition")
}

impl LanguageExtractor for PythonExtractor {
    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn extract_imports(&self, root: Node<'_>, source: &str) -> BTreeSet<String> {
        let mut imports = BTreeSet::new();
        for_each_node(root, |node| match node.kind() {
            "import_statement" => {
                let mut cursor = node.walk();
                for child in node.children_by_field_name("name", &mut cursor) {
                    imports.extend(module_of(child, source));
                }
            }
            "import_from_statement" => {
                if let Some(module) = node.child_by_field_name("module_name") {
                    imports.extend(module_of(module, source));
                }
            }
            _ => {}
        });
        imports
    }

    fn extract_definitions(&self, root: Node<'_>, source: &str) -> Vec<DefinitionRecord> {
        let mut defs = Vec::new();
        for_each_node(root, |node| match node.kind() {
            "function_definition" => {
                let Some(name) = field_text(node, "name", source) else {
                    return;
                };
                let params = field_text(node, "parameters", source).unwrap_or("()");
                let kind = if enclosing_class(node) {
                    DefinitionKind::Method
                } else {
                    DefinitionKind::Function
                };
                defs.push(DefinitionRecord {
                    name: name.to_string(),
                    kind,
                    signature: normalize_whitespace(&format!("{name}{params}")),
                    line: line_of(node),
                });
            }
            "class_definition" => {
                if let Some(name) = field_text(node, "name", source) {
                    defs.push(DefinitionRecord {
                        name: name.to_string(),
                        kind: DefinitionKind::Class,
                        signature: format!("class {name}"),
                        line: line_of(node),
                    });
                }
            }
            _ => {}
        });
        defs
    }

    fn extract_calls(&self, root: Node<'_>, source: &str) -> BTreeSet<String> {
        let mut calls = BTreeSet::new();
        for_each_node(root, |node| {
            if node.kind() != "call" {
                return;
            }
            if let Some(callee) = field_text(node, "function", source) {
                let name = last_segment(callee);
                if is_identifier(name) {
                    calls.insert(name.to_string());
                }
            }
        });
        calls
    }
}
