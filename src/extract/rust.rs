// src/extract/rust.rs

use std::collections::BTreeSet;

use tree_sitter::Node;

use super::walk::{field_text, for_each_node, last_segment, line_of, text};
use super::{DefinitionKind, DefinitionRecord, LanguageExtractor, is_identifier, normalize_whitespace};

/// Rust: `use` trees are reduced to their first meaningful segment (the
/// crate or the sibling module), `mod foo;` counts as an import of `foo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustExtractor;

fn split_top_level(group: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in group.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(group[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(group[start..].trim());
    items.into_iter().filter(|s| !s.is_empty()).collect()
}

/// Collect the root module(s) named by a `use` argument.
///
/// `crate::graph::store::X` -> `graph`, `std::io` -> `std`,
/// `super::{a, b::c}` -> `a`, `b`.
fn collect_use_roots(path: &str, out: &mut BTreeSet<String>) {
    let mut rest = path.trim().trim_start_matches("::").trim();
    loop {
        if let Some(inner) = rest.strip_prefix('{') {
            let inner = inner.strip_suffix('}').unwrap_or(inner);
            for item in split_top_level(inner) {
                collect_use_roots(item, out);
            }
            return;
        }

        let (head, tail) = match rest.find("::") {
            Some(i) => (&rest[..i], Some(rest[i + 2..].trim())),
            None => (rest, None),
        };
        let head = head.split_whitespace().next().unwrap_or("");

        match (head, tail) {
            ("crate" | "self" | "super", Some(tail)) => rest = tail,
            (name, _) => {
                if is_identifier(name) && !matches!(name, "crate" | "self" | "super") {
                    out.insert(name.to_string());
                }
                return;
            }
        }
    }
}

/// Functions inside `impl` or `trait` blocks are methods.
fn in_impl_or_trait(item: Node<'_>) -> bool {
    item.parent()
        .filter(|p| p.kind() == "declaration_list")
        .and_then(|p| p.parent())
        .is_some_and(|p| matches!(p.kind(), "impl_item" | "trait_item"))
}

fn callee_name<'s>(function: Node<'_>, source: &'s str) -> &'s str {
    match function.kind() {
        "identifier" => text(function, source),
        "scoped_identifier" => field_text(function, "name", source).unwrap_or(""),
        "field_expression" => field_text(function, "field", source).unwrap_or(""),
        "generic_function" => function
            .child_by_field_name("function")
            .map(|inner| callee_name(inner, source))
            .unwrap_or(""),
        _ => last_segment(text(function, source)),
    }
}

impl LanguageExtractor for RustExtractor {
    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn extract_imports(&self, root: Node<'_>, source: &str) -> BTreeSet<String> {
        let mut imports = BTreeSet::new();
        for_each_node(root, |node| match node.kind() {
            "use_declaration" => {
                if let Some(arg) = field_text(node, "argument", source) {
                    collect_use_roots(arg, &mut imports);
                }
            }
            "mod_item" if node.child_by_field_name("body").is_none() => {
                if let Some(name) = field_text(node, "name", source) {
                    imports.insert(name.to_string());
                }
            }
            "extern_crate_declaration" => {
                if let Some(name) = field_text(node, "name", source) {
                    imports.insert(name.to_string());
                }
            }
            _ => {}
        });
        imports
    }

    fn extract_definitions(&self, root: Node<'_>, source: &str) -> Vec<DefinitionRecord> {
        let mut defs = Vec::new();
        for_each_node(root, |node| {
            let (kind, keyword) = match node.kind() {
                "function_item" | "function_signature_item" => {
                    let kind = if in_impl_or_trait(node) {
                        DefinitionKind::Method
                    } else {
                        DefinitionKind::Function
                    };
                    (kind, "fn")
                }
                "struct_item" => (DefinitionKind::Struct, "struct"),
                "trait_item" => (DefinitionKind::Protocol, "trait"),
                _ => return,
            };
            let Some(name) = field_text(node, "name", source) else {
                return;
            };
            let signature = if keyword == "fn" {
                let params = field_text(node, "parameters", source).unwrap_or("()");
                normalize_whitespace(&format!("fn {name}{params}"))
            } else {
                format!("{keyword} {name}")
            };
            defs.push(DefinitionRecord {
                name: name.to_string(),
                kind,
                signature,
                line: line_of(node),
            });
        });
        defs
    }

    fn extract_calls(&self, root: Node<'_>, source: &str) -> BTreeSet<String> {
        let mut calls = BTreeSet::new();
        for_each_node(root, |node| {
            if node.kind() != "call_expression" {
                return;
            }
            if let Some(function) = node.child_by_field_name("function") {
                let name = callee_name(function, source);
                if is_identifier(name) {
                    calls.insert(name.to_string());
                }
            }
        });
        calls
    }
}
