//! Small helpers for writing Graphviz DOT source.

use std::fmt::Write;

/// Layout attributes shared by both graph variants.
pub(crate) const LAYOUT: [(&str, &str); 4] = [
    ("rankdir", "TB"),
    ("newrank", "true"),
    ("nodesep", "0.1"),
    ("ranksep", "2"),
];

/// [`LAYOUT`] as graph-level attributes.
pub(crate) fn layout_attributes() -> Attributes {
    LAYOUT
        .iter()
        .fold(Attributes::default(), |attrs, &(key, value)| attrs.with(key, value))
}

/// Fill for nodes and clusters reached under a condition.
pub const CONDITIONAL_FILL: &str = "#eeeeee";

/// Fill for everything else.
pub const DEFAULT_FILL: &str = "white";

/// Quote `value` as a DOT string.
pub(crate) fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// An ordered list of DOT attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(&'static str, String)>);

impl Attributes {
    /// Add an attribute, builder style.
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.0.push((key, value.into()));
        self
    }

    /// Look up an attribute value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// ` [key="value", ...]`, or nothing when empty.
    pub(crate) fn to_list(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let items: Vec<String> = self
            .0
            .iter()
            .map(|(key, value)| format!("{key}={}", quote(value)))
            .collect();
        format!(" [{}]", items.join(", "))
    }

    /// One `key="value";` statement per line, for graph and cluster bodies.
    pub(crate) fn write_statements(&self, out: &mut String, indent: usize) {
        for (key, value) in &self.0 {
            let _ = writeln!(out, "{:indent$}{key}={};", "", quote(value));
        }
    }
}

pub(crate) fn write_node(out: &mut String, indent: usize, id: &str, attributes: &Attributes) {
    let _ = writeln!(out, "{:indent$}{}{};", "", quote(id), attributes.to_list());
}

pub(crate) fn write_edge(out: &mut String, indent: usize, from: &str, to: &str, label: &str) {
    let _ = writeln!(
        out,
        "{:indent$}{} -> {} [label={}];",
        "",
        quote(from),
        quote(to),
        quote(label)
    );
}
