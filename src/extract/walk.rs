// src/extract/walk.rs

use tree_sitter::Node;

/// Pre-order visit of every node below (and including) `root`.
pub(crate) fn for_each_node<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

pub(crate) fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

pub(crate) fn field_text<'s>(node: Node<'_>, field: &str, source: &'s str) -> Option<&'s str> {
    node.child_by_field_name(field).map(|n| text(n, source))
}

pub(crate) fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

/// Last path segment of a callee expression (`a.b.c` -> `c`, `x::y` -> `y`).
pub(crate) fn last_segment(callee: &str) -> &str {
    let callee = callee.trim();
    let after_dot = callee.rsplit('.').next().unwrap_or(callee);
    after_dot.rsplit("::").next().unwrap_or(after_dot).trim()
}

/// Strip the quotes from a string literal's source text.
pub(crate) fn unquote(literal: &str) -> &str {
    literal.trim().trim_matches(|c| c == '"' || c == '\'' || c == '`')
}
