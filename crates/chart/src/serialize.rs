//! JSON rendering of a resolved tree.
//!
//! Each node becomes an object with keys in a fixed order:
//!
//! ```json
//! {
//!     "name": "app",
//!     "version": "1.0.0",
//!     "dependencies": {
//!         "lib": {
//!             "name": "lib",
//!             "version": "2.0.0",
//!             "repository": "https://charts.example.com",
//!             "condition": "enabled",
//!             "dependencies": {}
//!         }
//!     }
//! }
//! ```
//!
//! The root carries neither `repository` nor `condition`. `dependencies` is
//! present only for resolved nodes, so an unresolved dependency is an object
//! without that key.

use crate::tree::DependencyNode;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
struct NodeDocument<'a> {
    name: &'a str,
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    repository: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dependencies: Option<IndexMap<&'a str, NodeDocument<'a>>>,
}

impl<'a> From<&'a DependencyNode> for NodeDocument<'a> {
    fn from(node: &'a DependencyNode) -> Self {
        Self {
            name: &node.name,
            version: &node.version,
            repository: node.repository.as_deref(),
            condition: node
                .repository
                .as_ref()
                .map(|_| node.condition.as_str()),
            dependencies: node.resolved.then(|| {
                node.children
                    .iter()
                    .map(|(key, child)| (key.as_str(), Self::from(child)))
                    .collect()
            }),
        }
    }
}

impl Serialize for DependencyNode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        NodeDocument::from(self).serialize(serializer)
    }
}

/// Convert the tree into a JSON value with stable key order.
///
/// # Errors
///
/// Returns an error only if serialization fails, which cannot happen for
/// string-keyed trees but is surfaced rather than unwrapped.
pub fn to_document(tree: &DependencyNode) -> serde_json::Result<Value> {
    serde_json::to_value(tree)
}

/// Render the tree as pretty-printed JSON indented by four spaces.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_string(tree: &DependencyNode) -> serde_json::Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    tree.serialize(&mut serializer)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
