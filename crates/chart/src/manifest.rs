//! `Chart.yaml` parsing.
//!
//! Only the fields that matter for dependency resolution are extracted:
//! the chart's `name` and `version` and its `dependencies` list. Everything
//! else in the manifest (`apiVersion`, `description`, `alias`, `tags`, ...)
//! is ignored.

use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Conventional manifest file name inside a chart directory.
pub const MANIFEST_FILE: &str = "Chart.yaml";

/// A chart's identity and its declared direct dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartManifest {
    /// Chart name.
    pub name: String,
    /// Chart version.
    pub version: String,
    /// Declared dependencies, in declaration order.
    pub dependencies: Vec<DependencyRef>,
}

/// A declared, not yet resolved, reference to another chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
    /// Dependency chart name.
    pub name: String,
    /// Version constraint as written in the manifest.
    pub version: String,
    /// Repository or registry reference (not a filesystem path).
    pub repository: String,
    /// Activation condition label. Empty means unconditional.
    ///
    /// The condition is opaque display text and is never evaluated.
    pub condition: String,
}

/// Reads chart manifests from chart directories.
#[derive(Debug, Clone)]
pub struct ManifestReader {
    file_name: String,
}

impl Default for ManifestReader {
    fn default() -> Self {
        Self::new(MANIFEST_FILE)
    }
}

impl ManifestReader {
    /// Create a reader looking for `file_name` inside each chart directory.
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Path of the manifest inside `chart_dir`.
    #[must_use]
    pub fn manifest_path(&self, chart_dir: &Path) -> PathBuf {
        chart_dir.join(&self.file_name)
    }

    /// Read and validate the manifest of the chart at `chart_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingManifest`] if the manifest file does not exist,
    /// [`Error::MalformedManifest`] if it is not valid YAML or lacks a required
    /// field, and [`Error::Io`] if it cannot be read.
    pub fn read(&self, chart_dir: &Path) -> Result<ChartManifest> {
        let path = self.manifest_path(chart_dir);
        if !path.is_file() {
            return Err(Error::MissingManifest { path });
        }

        let content =
            fs::read_to_string(&path).map_err(|e| Error::io(e, &path, "reading chart manifest"))?;
        let manifest = ChartManifest::from_yaml_str(&content, &path)?;

        debug!(
            chart = %manifest.name,
            version = %manifest.version,
            dependencies = manifest.dependencies.len(),
            path = %path.display(),
            "Read chart manifest"
        );
        Ok(manifest)
    }
}

impl ChartManifest {
    /// Parse a manifest from YAML text. `path` is only used for error context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedManifest`] when the text is not YAML, is not a
    /// mapping, or is missing a required field.
    pub fn from_yaml_str(content: &str, path: &Path) -> Result<Self> {
        let document: Value = serde_yaml::from_str(content)
            .map_err(|e| Error::malformed_manifest(path, e.to_string()))?;
        let Value::Mapping(root) = document else {
            return Err(Error::malformed_manifest(
                path,
                "expected a mapping at the top level",
            ));
        };

        let name = required_string(&root, "name", path, "chart")?;
        let version = required_string(&root, "version", path, "chart")?;

        let dependencies = match root.get("dependencies") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Sequence(entries)) => entries
                .iter()
                .enumerate()
                .map(|(index, entry)| parse_dependency(entry, index, path))
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(Error::malformed_manifest(
                    path,
                    "'dependencies' must be a list",
                ));
            }
        };

        Ok(Self {
            name,
            version,
            dependencies,
        })
    }

    /// `name@version`, the label used for graph vertices.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

fn parse_dependency(entry: &Value, index: usize, path: &Path) -> Result<DependencyRef> {
    let Value::Mapping(fields) = entry else {
        return Err(Error::malformed_manifest(
            path,
            format!("dependency #{index} must be a mapping"),
        ));
    };
    let context = format!("dependency #{index}");

    Ok(DependencyRef {
        name: required_string(fields, "name", path, &context)?,
        version: required_string(fields, "version", path, &context)?,
        repository: required_string(fields, "repository", path, &context)?,
        condition: match fields.get("condition") {
            None | Some(Value::Null) => String::new(),
            Some(value) => scalar_to_string(value).ok_or_else(|| {
                Error::malformed_manifest(path, format!("{context}: 'condition' must be a string"))
            })?,
        },
    })
}

fn required_string(fields: &Mapping, key: &str, path: &Path, context: &str) -> Result<String> {
    match fields.get(key) {
        None | Some(Value::Null) => Err(Error::malformed_manifest(
            path,
            format!("{context}: missing required field '{key}'"),
        )),
        Some(value) => scalar_to_string(value).ok_or_else(|| {
            Error::malformed_manifest(path, format!("{context}: '{key}' must be a string"))
        }),
    }
}

/// Versions such as `1.0` are read by YAML as numbers; accept any scalar.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
