// src/extract/javascript.rs

use std::collections::BTreeSet;

use tree_sitter::Node;

use super::walk::{field_text, for_each_node, last_segment, line_of, text, unquote};
use super::{DefinitionKind, DefinitionRecord, LanguageExtractor, is_identifier, normalize_whitespace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    JavaScript,
    TypeScript,
    Tsx,
}

/// JavaScript and TypeScript share node names, so one extractor serves all
/// three grammars. Imports are the raw module specifier (`./utils`,
/// `react`); `require` and dynamic `import()` count too.
#[derive(Debug, Clone, Copy)]
pub struct JsExtractor {
    dialect: Dialect,
}

pub static JAVASCRIPT: JsExtractor = JsExtractor {
    dialect: Dialect::JavaScript,
};
pub static TYPESCRIPT: JsExtractor = JsExtractor {
    dialect: Dialect::TypeScript,
};
pub static TSX: JsExtractor = JsExtractor {
    dialect: Dialect::Tsx,
};

impl JsExtractor {
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}

fn first_string_argument(call: Node<'_>, source: &str) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let first = args.named_children(&mut cursor).next()?;
    (first.kind() == "string").then(|| unquote(text(first, source)).to_string())
}

fn callee_name<'s>(function: Node<'_>, source: &'s str) -> &'s str {
    match function.kind() {
        "identifier" => text(function, source),
        "member_expression" => field_text(function, "property", source).unwrap_or(""),
        _ => last_segment(text(function, source)),
    }
}

impl LanguageExtractor for JsExtractor {
    fn grammar(&self) -> tree_sitter::Language {
        match self.dialect {
            Dialect::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    fn extract_imports(&self, root: Node<'_>, source: &str) -> BTreeSet<String> {
        let mut imports = BTreeSet::new();
        for_each_node(root, |node| match node.kind() {
            "import_statement" | "export_statement" => {
                if let Some(src) = field_text(node, "source", source) {
                    let module = unquote(src);
                    if !module.is_empty() {
                        imports.insert(module.to_string());
                    }
                }
            }
            "call_expression" => {
                let Some(function) = node.child_by_field_name("function") else {
                    return;
                };
                let is_loader = function.kind() == "import"
                    || (function.kind() == "identifier" && text(function, source) == "require");
                if is_loader {
                    imports.extend(first_string_argument(node, source).filter(|m| !m.is_empty()));
                }
            }
            _ => {}
        });
        imports
    }

    fn extract_definitions(&self, root: Node<'_>, source: &str) -> Vec<DefinitionRecord> {
        let mut defs = Vec::new();
        for_each_node(root, |node| {
            let kind = node.kind();
            let Some(name) = field_text(node, "name", source) else {
                return;
            };
            let params = || field_text(node, "parameters", source).unwrap_or("()");
            let (def_kind, signature) = match kind {
                "function_declaration" | "generator_function_declaration" => (
                    DefinitionKind::Function,
                    normalize_whitespace(&format!("function {name}{}", params())),
                ),
                "method_definition" => (
                    DefinitionKind::Method,
                    normalize_whitespace(&format!("{name}{}", params())),
                ),
                "class_declaration" | "abstract_class_declaration" => {
                    (DefinitionKind::Class, format!("class {name}"))
                }
                "interface_declaration" => (DefinitionKind::Protocol, format!("interface {name}")),
                _ => return,
            };
            defs.push(DefinitionRecord {
                name: name.to_string(),
                kind: def_kind,
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
            let Some(function) = node.child_by_field_name("function") else {
                return;
            };
            if function.kind() == "import" {
                return;
            }
            let name = callee_name(function, source);
            if is_identifier(name) && name != "require" {
                calls.insert(name.to_string());
            }
        });
        calls
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Language, extract_source};
    use super::*;

    const JS: &str = r#"import React from 'react';
import { format } from "./utils/format";
export * from './reexported';
const fs = require('fs');

function render(props, ctx) {
  return format(props.title).trim();
}

class Widget {
  draw(canvas) {
    canvas.fill();
    render({}, null);
  }
}

async function load() {
  const mod = await import('./lazy');
  return mod;
}
"#;

    #[test]
    fn imports_are_module_specifiers() {
        let ex = extract_source(JS, Language::JavaScript);
        let imports: Vec<_> = ex.imports.iter().map(String::as_str).collect();
        assert_eq!(
            imports,
            vec!["./lazy", "./reexported", "./utils/format", "fs", "react"]
        );
    }

    #[test]
    fn definitions_and_calls() {
        let ex = extract_source(JS, Language::JavaScript);
        let sigs: Vec<_> = ex
            .definitions
            .iter()
            .map(|d| (d.kind, d.signature.as_str()))
            .collect();
        assert_eq!(
            sigs,
            vec![
                (DefinitionKind::Function, "function render(props, ctx)"),
                (DefinitionKind::Class, "class Widget"),
                (DefinitionKind::Method, "draw(canvas)"),
                (DefinitionKind::Function, "function load()"),
            ]
        );
        let calls: Vec<_> = ex.calls.iter().map(String::as_str).collect();
        assert_eq!(calls, vec!["fill", "format", "render", "trim"]);
    }

    #[test]
    fn typescript_interfaces_are_protocols() {
        let src = "import { Db } from './db';\n\
                   export interface Store { get(key: string): string; }\n\
                   export function open(path: string): Store { return connect(path); }\n";
        let ex = extract_source(src, Language::TypeScript);
        assert!(ex.imports.contains("./db"));
        let sigs: Vec<_> = ex.definitions.iter().map(|d| d.signature.as_str()).collect();
        assert_eq!(sigs, vec!["interface Store", "function open(path: string)"]);
        assert!(ex.calls.contains("connect"));
    }
}
