//! The clustered dependency graph.
//!
//! Each chart with dependencies is drawn as a Graphviz cluster holding its own
//! node and the leaf charts it pulls in; charts with their own dependencies
//! nest as sub-clusters. Node ids are path-qualified so that a chart used in
//! several places is drawn once per place.

use crate::GraphDocument;
use crate::dot::{self, Attributes, CONDITIONAL_FILL, DEFAULT_FILL};
use helmdeps_chart::DependencyNode;
use std::fmt::Write;
use tracing::debug;

/// A drawable node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    /// Path-qualified node id.
    pub id: String,
    /// `name@version`.
    pub label: String,
    /// Filled grey instead of white.
    pub conditional: bool,
}

impl Shape {
    fn attributes(&self) -> Attributes {
        let fill = if self.conditional {
            CONDITIONAL_FILL
        } else {
            DEFAULT_FILL
        };
        Attributes::default()
            .with("label", self.label.as_str())
            .with("style", "filled")
            .with("fillcolor", fill)
    }
}

/// An edge between two shape ids, labeled with the child's condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Parent shape id.
    pub from: String,
    /// Child shape id.
    pub to: String,
    /// Child condition, possibly empty.
    pub label: String,
}

/// A chart with dependencies, drawn as a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Id of the chart's own shape; the cluster is named `cluster_<id>`.
    pub id: String,
    /// Cluster background is filled grey.
    pub conditional: bool,
    /// The chart's own shape first, then its leaf dependencies.
    pub shapes: Vec<Shape>,
    /// Edges from the chart's shape to each dependency.
    pub edges: Vec<Edge>,
    /// Dependencies that have dependencies of their own.
    pub clusters: Vec<Cluster>,
}

impl Cluster {
    fn build(node: &DependencyNode, id: String, conditional: bool) -> Self {
        let mut cluster = Self {
            shapes: vec![Shape {
                id: id.clone(),
                label: node.label(),
                conditional: false,
            }],
            id,
            conditional,
            edges: Vec::new(),
            clusters: Vec::new(),
        };

        for child in node.children.values() {
            let label = child.label();
            let child_id = format!("{}__{label}", cluster.id);
            if child.is_leaf() {
                cluster.shapes.push(Shape {
                    id: child_id.clone(),
                    label,
                    conditional: child.is_conditional(),
                });
            } else {
                cluster
                    .clusters
                    .push(Self::build(child, child_id.clone(), child.is_conditional()));
            }
            cluster.edges.push(Edge {
                from: cluster.id.clone(),
                to: child_id,
                label: child.condition.clone(),
            });
        }

        cluster
    }

    /// This cluster and every cluster nested in it.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        1 + self.clusters.iter().map(Cluster::cluster_count).sum::<usize>()
    }

    /// Leaf shapes in this cluster and every nested one.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.shapes.len().saturating_sub(1)
            + self.clusters.iter().map(Cluster::leaf_count).sum::<usize>()
    }

    fn write(&self, out: &mut String, indent: usize) {
        let inner = indent + 4;
        let name = dot::quote(&format!("cluster_{}", self.id));
        let _ = writeln!(out, "{:indent$}subgraph {name} {{", "");
        if self.conditional {
            Attributes::default()
                .with("style", "filled")
                .with("fillcolor", CONDITIONAL_FILL)
                .write_statements(out, inner);
        }
        // Shapes before edges so every node is declared inside its own cluster.
        for shape in &self.shapes {
            dot::write_node(out, inner, &shape.id, &shape.attributes());
        }
        for cluster in &self.clusters {
            cluster.write(out, inner);
        }
        for edge in &self.edges {
            dot::write_edge(out, inner, &edge.from, &edge.to, &edge.label);
        }
        let _ = writeln!(out, "{:indent$}}}", "");
    }
}

/// A tree of nested clusters rooted at the top-level chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusteredGraph {
    root: Cluster,
}

impl ClusteredGraph {
    /// Lay `tree` out as nested clusters. The root is always a cluster.
    #[must_use]
    pub fn build(tree: &DependencyNode) -> Self {
        let root = Cluster::build(tree, tree.label(), false);
        debug!(
            clusters = root.cluster_count(),
            leaves = root.leaf_count(),
            "Built clustered dependency graph"
        );
        Self { root }
    }

    /// The top-level chart's cluster.
    #[must_use]
    pub fn root(&self) -> &Cluster {
        &self.root
    }

    /// Number of clusters, the root included.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.root.cluster_count()
    }

    /// Number of leaf shapes across all clusters.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }
}

impl GraphDocument for ClusteredGraph {
    fn to_dot(&self) -> String {
        let mut out = String::from("digraph {\n");
        dot::layout_attributes()
            .with("compound", "true")
            .write_statements(&mut out, 4);
        self.root.write(&mut out, 4);
        out.push_str("}\n");
        out
    }
}
