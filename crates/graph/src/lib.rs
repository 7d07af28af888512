//! Graph views of a resolved Helm dependency tree.
//!
//! Two layouts are available:
//!
//! - [`FlatGraph`]: one vertex per distinct `name@version`, edges labeled with
//!   the dependency condition.
//! - [`ClusteredGraph`]: nested Graphviz clusters mirroring the tree, with
//!   conditional charts filled grey.
//!
//! Both implement [`GraphDocument`] and can be written out by a [`Renderer`],
//! either as DOT source or as an image produced by the Graphviz `dot` binary.

pub mod clustered;
mod dot;
pub mod error;
pub mod flat;
pub mod render;

pub use clustered::{Cluster, ClusteredGraph, Edge, Shape};
pub use dot::{Attributes, CONDITIONAL_FILL, DEFAULT_FILL};
pub use error::{Error, Result};
pub use flat::{FlatGraph, GRAPH_NAME};
pub use render::{DEFAULT_DOT_BINARY, ImageFormat, Renderer};

/// Anything that can be written as Graphviz DOT source.
pub trait GraphDocument {
    /// The complete `digraph { ... }` source.
    fn to_dot(&self) -> String;
}
