//! Output directory checks, file naming and writers.

use crate::cli::{CliError, OutputType};
use helmdeps_chart::DependencyNode;
use helmdeps_graph::{ClusteredGraph, FlatGraph, ImageFormat, Renderer};
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Fail unless `dir` exists and is a directory.
///
/// # Errors
///
/// Returns [`CliError::Config`] naming the offending path.
pub fn validate_output_dir(dir: &Path) -> Result<(), CliError> {
    if !dir.exists() {
        return Err(CliError::config_with_help(
            format!("{} does not exist", dir.display()),
            "Create the directory or pass a different --output-dir",
        ));
    }
    if !dir.is_dir() {
        return Err(CliError::config(format!(
            "{} is not a valid directory",
            dir.display()
        )));
    }
    Ok(())
}

/// Fail unless `chart` can be used as a file name inside the output directory.
///
/// # Errors
///
/// Returns [`CliError::Render`] for names that are empty or carry path components.
pub fn validate_chart_name(chart: &str) -> Result<(), CliError> {
    let mut components = Path::new(chart).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == chart => Ok(()),
        _ => Err(CliError::Render {
            message: format!("Chart name '{chart}' cannot be used as a file name"),
            help: Some("Chart names must not contain path separators".to_string()),
        }),
    }
}

/// File name for a chart's output of the given type.
#[must_use]
pub fn file_name(chart: &str, output_type: OutputType, format: ImageFormat) -> String {
    match output_type {
        OutputType::Graph => format!("{chart}_dependencies_graph.{}", format.extension()),
        OutputType::CombinedGraph => {
            format!("{chart}_dependencies_graph_combined.{}", format.extension())
        }
        OutputType::Json => format!("{chart}_dependency.json"),
    }
}

/// Writes one output for a resolved tree.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
    output_type: OutputType,
    format: ImageFormat,
    renderer: Renderer,
}

impl OutputWriter {
    /// A writer into `dir`. `format` is ignored for JSON output.
    #[must_use]
    pub fn new(
        dir: impl Into<PathBuf>,
        output_type: OutputType,
        format: ImageFormat,
        renderer: Renderer,
    ) -> Self {
        Self {
            dir: dir.into(),
            output_type,
            format,
            renderer,
        }
    }

    /// Write `tree` and return the path written.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Render`] if the chart name is not a plain file name,
    /// or if serialization, Graphviz or the write fails.
    pub fn write(&self, tree: &DependencyNode) -> Result<PathBuf, CliError> {
        validate_chart_name(&tree.name)?;
        let path = self
            .dir
            .join(file_name(&tree.name, self.output_type, self.format));

        match self.output_type {
            OutputType::Graph => {
                self.renderer
                    .render(&ClusteredGraph::build(tree), self.format, &path)?;
            }
            OutputType::CombinedGraph => {
                self.renderer
                    .render(&FlatGraph::build(tree), self.format, &path)?;
            }
            OutputType::Json => {
                let json = helmdeps_chart::to_json_string(tree)
                    .map_err(|e| CliError::render(format!("Failed to serialize dependency tree: {e}")))?;
                std::fs::write(&path, json).map_err(|e| {
                    CliError::render(format!("Failed to write {}: {e}", path.display()))
                })?;
            }
        }

        info!(path = %path.display(), "Outputting to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use helmdeps_chart::ChartManifest;

    fn tree() -> DependencyNode {
        named("app")
    }

    fn named(name: &str) -> DependencyNode {
        DependencyNode::root(&ChartManifest {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            dependencies: Vec::new(),
        })
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            file_name("app", OutputType::Graph, ImageFormat::Png),
            "app_dependencies_graph.png"
        );
        assert_eq!(
            file_name("app", OutputType::CombinedGraph, ImageFormat::Svg),
            "app_dependencies_graph_combined.svg"
        );
        assert_eq!(
            file_name("app", OutputType::Json, ImageFormat::Png),
            "app_dependency.json"
        );
    }

    #[test]
    fn test_validate_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_output_dir(dir.path()).is_ok());

        let missing = dir.path().join("missing");
        let err = validate_output_dir(&missing).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
        assert!(err.to_string().contains("does not exist"));

        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        let err = validate_output_dir(&file).unwrap_err();
        assert!(err.to_string().contains("is not a valid directory"));
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), OutputType::Json, ImageFormat::Png, Renderer::default());

        let path = writer.write(&tree()).unwrap();

        assert_eq!(path, dir.path().join("app_dependency.json"));
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("    \"name\": \"app\""));
    }

    #[test]
    fn test_write_dot_source() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), OutputType::Graph, ImageFormat::Dot, Renderer::default());

        let path = writer.write(&tree()).unwrap();

        assert_eq!(path, dir.path().join("app_dependencies_graph.dot"));
        assert!(std::fs::read_to_string(path).unwrap().contains("cluster_app@1.0.0"));
    }

    #[test]
    fn test_chart_names_with_path_components_are_rejected() {
        assert!(validate_chart_name("app").is_ok());
        assert!(validate_chart_name("my-app.v2").is_ok());
        for name in ["", ".", "..", "../x", "a/b", "/etc/app"] {
            let err = validate_chart_name(name).unwrap_err();
            assert!(matches!(err, CliError::Render { .. }), "{name}");
        }
    }

    #[test]
    fn test_write_does_not_escape_output_dir() {
        let parent = tempfile::tempdir().unwrap();
        let dir = parent.path().join("out");
        std::fs::create_dir(&dir).unwrap();
        let writer = OutputWriter::new(&dir, OutputType::Json, ImageFormat::Png, Renderer::default());

        let err = writer.write(&named("../x")).unwrap_err();

        assert!(err.to_string().contains("../x"));
        assert!(!parent.path().join("x_dependency.json").exists());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }
}
