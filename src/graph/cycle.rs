// src/graph/cycle.rs

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::graph::resolve::{ImportResolver, SubstringResolver};
use crate::graph::store::DependencyGraphStore;

/// File-level import graph: an edge `a -> b` means an import of `a`
/// resolves to `b`. Self-imports are dropped.
#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    graph: DiGraph<String, ()>,
}

impl ImportGraph {
    pub fn build(store: &DependencyGraphStore) -> Self {
        Self::build_with(store, &SubstringResolver)
    }

    pub fn build_with(store: &DependencyGraphStore, resolver: &dyn ImportResolver) -> Self {
        let mut graph = DiGraph::new();
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();
        for path in store.paths() {
            index.insert(path, graph.add_node(path.to_string()));
        }

        for (from, entry) in store.iter() {
            for to in store.paths() {
                if from == to {
                    continue;
                }
                if entry.imports.iter().any(|imp| resolver.resolves_to(imp, to)) {
                    graph.add_edge(index[from], index[to], ());
                }
            }
        }

        Self { graph }
    }

    /// Build directly from an edge list; used by tests and callers that
    /// already resolved their edges.
    pub fn from_edges<'a>(nodes: impl IntoIterator<Item = &'a str>, edges: &[(&str, &str)]) -> Self {
        let mut graph = DiGraph::new();
        let mut index: HashMap<String, NodeIndex> = HashMap::new();
        for node in nodes {
            index
                .entry(node.to_string())
                .or_insert_with(|| graph.add_node(node.to_string()));
        }
        for (from, to) in edges {
            if from == to {
                continue;
            }
            let a = *index
                .entry(from.to_string())
                .or_insert_with(|| graph.add_node(from.to_string()));
            let b = *index
                .entry(to.to_string())
                .or_insert_with(|| graph.add_node(to.to_string()));
            graph.update_edge(a, b, ());
        }
        Self { graph }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn as_petgraph(&self) -> &DiGraph<String, ()> {
        &self.graph
    }

    fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut next: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        // Popped from the back, so reverse order gives a path-ordered walk.
        next.sort_by(|a, b| b.cmp(a));
        next
    }

    /// Find one cycle, returned as the node paths along it.
    ///
    /// Iterative DFS with an explicit stack; a back edge to a node still on
    /// the stack closes the cycle.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let n = self.graph.node_count();
        let mut visited = vec![false; n];
        let mut on_stack = vec![false; n];

        for start in self.graph.node_indices() {
            if visited[start.index()] {
                continue;
            }
            visited[start.index()] = true;
            on_stack[start.index()] = true;
            let mut stack: Vec<(NodeIndex, Vec<NodeIndex>)> = vec![(start, self.successors(start))];

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                match top.1.pop() {
                    Some(next) if on_stack[next.index()] => {
                        let from = stack.iter().position(|(n, _)| *n == next).unwrap_or(0);
                        return Some(
                            stack[from..]
                                .iter()
                                .map(|(n, _)| self.graph[*n].clone())
                                .collect(),
                        );
                    }
                    Some(next) if !visited[next.index()] => {
                        visited[next.index()] = true;
                        on_stack[next.index()] = true;
                        let succ = self.successors(next);
                        stack.push((next, succ));
                    }
                    Some(_) => {}
                    None => {
                        on_stack[node.index()] = false;
                        stack.pop();
                    }
                }
            }
        }

        None
    }

    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }
}

/// Whether the import graph over `store` contains a cycle.
pub fn has_cycle(store: &DependencyGraphStore) -> bool {
    ImportGraph::build(store).has_cycle()
}
