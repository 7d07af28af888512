//! The flat ("combined") dependency graph.
//!
//! Every distinct `name@version` becomes one vertex, no matter how many times
//! it occurs in the tree, and every parent/child relationship becomes an edge
//! labeled with the child's condition. A relationship repeated in several
//! sub-trees is drawn as parallel edges.

use crate::GraphDocument;
use crate::dot::{self, Attributes};
use helmdeps_chart::DependencyNode;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use tracing::debug;

/// Name of the emitted DOT graph.
pub const GRAPH_NAME: &str = "helm_dependencies";

/// A single-level directed graph over `name@version` labels.
#[derive(Debug, Clone, Default)]
pub struct FlatGraph {
    graph: DiGraph<String, String>,
    /// Vertex identity is the label.
    index: HashMap<String, NodeIndex>,
}

impl FlatGraph {
    /// Flatten `tree` depth-first.
    #[must_use]
    pub fn build(tree: &DependencyNode) -> Self {
        let mut flat = Self::default();
        tree.walk(&mut |parent, node| {
            let to = flat.add_vertex(node.label());
            if let Some(parent) = parent {
                let from = flat.add_vertex(parent.label());
                flat.graph.add_edge(from, to, node.condition.clone());
            }
        });
        debug!(
            vertices = flat.vertex_count(),
            edges = flat.edge_count(),
            "Built flat dependency graph"
        );
        flat
    }

    fn add_vertex(&mut self, label: String) -> NodeIndex {
        if let Some(&index) = self.index.get(&label) {
            return index;
        }
        let index = self.graph.add_node(label.clone());
        self.index.insert(label, index);
        index
    }

    /// Number of distinct vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges, one per parent/child relationship.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether a vertex with this label exists.
    #[must_use]
    pub fn contains_vertex(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Vertex labels in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// `(from, to, label)` for every edge, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].as_str(),
                self.graph[edge.target()].as_str(),
                edge.weight().as_str(),
            )
        })
    }
}

impl GraphDocument for FlatGraph {
    fn to_dot(&self) -> String {
        let mut out = format!("digraph {} {{\n", dot::quote(GRAPH_NAME));
        dot::layout_attributes().write_statements(&mut out, 4);
        for label in self.vertices() {
            dot::write_node(&mut out, 4, label, &Attributes::default());
        }
        for (from, to, label) in self.edges() {
            dot::write_edge(&mut out, 4, from, to, label);
        }
        out.push_str("}\n");
        out
    }
}
