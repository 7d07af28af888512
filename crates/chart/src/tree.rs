//! The resolved dependency tree.

use crate::manifest::{ChartManifest, DependencyRef};
use indexmap::IndexMap;
use tracing::debug;

/// A chart in the resolved dependency tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    /// Chart name.
    pub name: String,
    /// Chart version. For dependencies this is the version constraint declared
    /// by the parent.
    pub version: String,
    /// Repository reference declared by the parent. `None` for the root.
    pub repository: Option<String>,
    /// Condition under which the parent includes this chart. Empty when
    /// unconditional, and always empty for the root.
    pub condition: String,
    /// Resolved or placeholder children, keyed by dependency name, in
    /// declaration order.
    pub children: IndexMap<String, DependencyNode>,
    /// Whether a manifest was found for this chart and expanded recursively.
    pub resolved: bool,
}

impl DependencyNode {
    /// A resolved root node with one unresolved placeholder per declared dependency.
    #[must_use]
    ///
    /// A name declared twice keeps its first position and its last declaration.
    pub fn root(manifest: &ChartManifest) -> Self {
        let mut children = IndexMap::with_capacity(manifest.dependencies.len());
        for dependency in &manifest.dependencies {
            if children
                .insert(dependency.name.clone(), Self::placeholder(dependency))
                .is_some()
            {
                debug!(
                    chart = %manifest.name,
                    dependency = %dependency.name,
                    "Dependency declared more than once; keeping the last declaration"
                );
            }
        }

        Self {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            repository: None,
            condition: String::new(),
            children,
            resolved: true,
        }
    }

    /// An unresolved node standing in for a declared dependency.
    #[must_use]
    pub fn placeholder(dependency: &DependencyRef) -> Self {
        Self {
            name: dependency.name.clone(),
            version: dependency.version.clone(),
            repository: Some(dependency.repository.clone()),
            condition: dependency.condition.clone(),
            children: IndexMap::new(),
            resolved: false,
        }
    }

    /// `name@version`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    /// Whether the parent gates this chart behind a condition.
    #[must_use]
    pub fn is_conditional(&self) -> bool {
        !self.condition.is_empty()
    }

    /// Whether this node has no children to draw.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, this node included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .values()
            .map(DependencyNode::node_count)
            .sum::<usize>()
    }

    /// Depth-first, pre-order walk over this subtree.
    ///
    /// The visitor receives each node together with its parent (`None` for
    /// the node the walk started from).
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(Option<&'a DependencyNode>, &'a DependencyNode),
    {
        fn go<'a, F>(parent: Option<&'a DependencyNode>, node: &'a DependencyNode, visit: &mut F)
        where
            F: FnMut(Option<&'a DependencyNode>, &'a DependencyNode),
        {
            visit(parent, node);
            for child in node.children.values() {
                go(Some(node), child, visit);
            }
        }
        go(None, self, visit);
    }
}
